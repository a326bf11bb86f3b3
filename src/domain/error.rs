//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and builders that
//! validate inputs.
//!
//! # Examples
//!
//! ```
//! use yieldlord::domain::error::DomainError;
//! use yieldlord::domain::opportunity::Opportunity;
//! use rust_decimal_macros::dec;
//!
//! let result = Opportunity::builder()
//!     .protocol("Aave V3", "aavev3")
//!     .asset("aArbUSDC", "USDC", "0xaf88d065e77c8cC2239327C5EDb3A432268e5831")
//!     .apy(dec!(-0.01))
//!     .liquidity(dec!(1000000))
//!     .build();
//!
//! assert!(matches!(result, Err(DomainError::NegativeApy { .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was never provided.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A required identifier was empty.
    #[error("{field} cannot be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// APY must be non-negative.
    #[error("apy must be non-negative, got {apy}")]
    NegativeApy {
        /// The invalid APY.
        apy: Decimal,
    },

    /// Liquidity must be non-negative.
    #[error("liquidity must be non-negative, got {liquidity}")]
    NegativeLiquidity {
        /// The invalid liquidity.
        liquidity: Decimal,
    },

    /// Fractional rates must lie in [0, 1].
    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfBounds {
        /// Name of the rate.
        field: &'static str,
        /// The invalid value.
        value: Decimal,
    },

    /// Amounts that represent held or deposited capital must be positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// Held balances cannot be negative.
    #[error("balance must be non-negative, got {balance}")]
    NegativeBalance {
        /// The invalid balance.
        balance: Decimal,
    },

    /// Target allocations cannot be negative.
    #[error("allocation amount must be non-negative, got {amount}")]
    NegativeAllocation {
        /// The invalid amount.
        amount: Decimal,
    },

    /// Capital for a decision cycle cannot be negative.
    #[error("capital must be non-negative, got {capital}")]
    NegativeCapital {
        /// The invalid capital.
        capital: Decimal,
    },

    /// Arithmetic left the representable decimal range.
    #[error("{operation} overflowed")]
    Overflow {
        /// What was being computed.
        operation: &'static str,
    },

    /// Per-protocol concentration limit must be in (0, 1].
    #[error("max_per_protocol must be in (0, 1], got {value}")]
    InvalidConcentrationLimit {
        /// The invalid limit.
        value: Decimal,
    },
}
