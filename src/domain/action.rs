//! Concrete portfolio moves emitted by the rebalancer.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::opportunity::Opportunity;
use super::position::Holding;

/// A deposit or withdrawal needed to move from current to target state.
///
/// Actions only live for one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Deposit { target: Opportunity, amount: Decimal },
    Withdraw { source: Holding, amount: Decimal },
}

impl Action {
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Deposit { amount, .. } | Self::Withdraw { amount, .. } => *amount,
        }
    }

    /// The opportunity this action moves capital into or out of.
    #[must_use]
    pub const fn opportunity(&self) -> &Opportunity {
        match self {
            Self::Deposit { target, .. } => target,
            Self::Withdraw { source, .. } => source.opportunity(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
        }
    }

    #[must_use]
    pub const fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opp = self.opportunity();
        write!(
            f,
            "{} {} {} on {}",
            self.kind(),
            self.amount(),
            opp.asset(),
            opp.protocol_key()
        )
    }
}

/// A suggestion to move a holding's full balance into a better-yielding
/// opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Migration {
    pub from: Holding,
    pub to: Opportunity,
    pub amount: Decimal,
}

impl Migration {
    /// APY gained by making the move.
    #[must_use]
    pub fn apy_gain(&self) -> Decimal {
        self.to.apy() - self.from.opportunity().apy()
    }
}
