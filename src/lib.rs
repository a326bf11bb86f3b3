//! Yieldlord - DeFi yield allocation, rebalancing, and execution.
//!
//! One decision cycle takes a snapshot of lending opportunities, splits
//! capital across them in proportion to APY, caps each protocol's share,
//! diffs the result against current holdings, and executes the resulting
//! withdrawals and deposits on-chain one at a time.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Opportunities, holdings, allocations, actions, positions
//! - [`port`] - Traits at the edges: feed, transaction builder, chain, signer
//! - [`application`] - Optimizer, risk limiter, rebalancer, execution
//!   pipeline, decision engine, market analyzer
//! - [`adapter`] - Portals HTTP client, alloy RPC client and signer, token
//!   registry, CLI
//! - [`infrastructure`] - Configuration, logging, retry, wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use yieldlord::application::optimizer::YieldOptimizer;
//! use yieldlord::domain::Opportunity;
//!
//! let fluid = Opportunity::builder()
//!     .protocol("Fluid", "fluid")
//!     .asset("fUSDC", "USDC", "0x1A996cb54bb95462040408C06122D45D6Cdb6096")
//!     .apy(dec!(0.06))
//!     .liquidity(dec!(1000000))
//!     .build()
//!     .unwrap();
//!
//! let allocations = YieldOptimizer::new()
//!     .suggest_allocations(dec!(1000), &[fluid])
//!     .unwrap();
//! assert_eq!(allocations[0].amount(), dec!(1000));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
