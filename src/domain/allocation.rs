//! Target allocations produced by the optimizer.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::DomainError;
use super::opportunity::Opportunity;

/// A target capital amount assigned to an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    opportunity: Opportunity,
    amount: Decimal,
}

impl Allocation {
    /// Create an allocation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegativeAllocation` if `amount` is negative.
    pub fn new(opportunity: Opportunity, amount: Decimal) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::NegativeAllocation { amount });
        }
        Ok(Self {
            opportunity,
            amount,
        })
    }

    #[must_use]
    pub const fn opportunity(&self) -> &Opportunity {
        &self.opportunity
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub fn protocol_key(&self) -> &str {
        self.opportunity.protocol_key()
    }

    /// Same allocation reduced to `amount`. Callers only ever shrink a
    /// non-negative allocation, so the invariant is preserved.
    #[must_use]
    pub(crate) fn clipped_to(self, amount: Decimal) -> Self {
        Self {
            opportunity: self.opportunity,
            amount: amount.max(Decimal::ZERO),
        }
    }
}

/// Sum of allocation amounts.
#[must_use]
pub fn total_amount(allocations: &[Allocation]) -> Decimal {
    allocations
        .iter()
        .map(Allocation::amount)
        .fold(Decimal::ZERO, |acc, a| acc + a)
}
