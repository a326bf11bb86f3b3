//! Action execution port.

use async_trait::async_trait;

use crate::domain::{Action, TxHash};
use crate::error::ExecutionError;
use crate::port::outbound::chain::TxReceipt;

/// How an action ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Mined with a successful receipt.
    Confirmed { tx_hash: TxHash, receipt: TxReceipt },
    /// Submitted but not mined before the confirmation timeout. The
    /// transaction may still land later, so it must not be resubmitted.
    Pending { tx_hash: TxHash },
    /// Never submitted, rejected, or reverted.
    Failed { error: ExecutionError },
}

impl Outcome {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Hash of the submitted transaction, if one was submitted.
    #[must_use]
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            Self::Confirmed { tx_hash, .. } | Self::Pending { tx_hash } => Some(tx_hash),
            Self::Failed {
                error: ExecutionError::OnChainRevert { tx_hash },
            } => Some(tx_hash),
            Self::Failed { .. } => None,
        }
    }

    /// Short label for tables and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Confirmed { .. } => "confirmed",
            Self::Pending { .. } => "pending",
            Self::Failed { .. } => "failed",
        }
    }
}

/// An action paired with its outcome.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub action: Action,
    pub outcome: Outcome,
}

impl ExecutionResult {
    #[must_use]
    pub const fn new(action: Action, outcome: Outcome) -> Self {
        Self { action, outcome }
    }

    pub(crate) fn failed(action: Action, error: ExecutionError) -> Self {
        Self {
            action,
            outcome: Outcome::Failed { error },
        }
    }
}

/// Executes one action end to end.
///
/// Implementations never panic or return early on failure; every failure is
/// reported through `Outcome::Failed`.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: Action) -> ExecutionResult;
}
