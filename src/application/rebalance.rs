//! Rebalance differencer.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::domain::{Action, Allocation, Holding, Opportunity};
use crate::port::outbound::feed::AccountBalance;

/// Deltas smaller than this are treated as already balanced.
pub const REBALANCE_TOLERANCE: Decimal = dec!(0.00000001);

/// Diffs target allocations against current holdings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rebalancer;

impl Rebalancer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emit the deposits and withdrawals that move `holdings` to `targets`.
    ///
    /// Holdings are keyed by `(asset, protocol key)`. If two holdings share a
    /// key the later one wins; a warning is logged since the earlier balance
    /// is then invisible to the diff. Holdings without a target are left
    /// alone: only allocations drive actions.
    #[must_use]
    pub fn compute_rebalance(&self, holdings: &[Holding], targets: &[Allocation]) -> Vec<Action> {
        let mut current: HashMap<(&str, &str), &Holding> = HashMap::with_capacity(holdings.len());
        for holding in holdings {
            if let Some(previous) = current.insert(holding.key(), holding) {
                warn!(
                    asset = holding.key().0,
                    protocol = holding.key().1,
                    dropped_balance = %previous.balance(),
                    "Duplicate holding key, keeping the last one"
                );
            }
        }

        let mut actions = Vec::new();
        for target in targets {
            let key = target.opportunity().position_key();
            let held = current.get(&key).copied();
            let balance = held.map_or(Decimal::ZERO, Holding::balance);
            let delta = target.amount() - balance;

            if delta.abs() < REBALANCE_TOLERANCE {
                continue;
            }

            let action = match held {
                Some(source) if delta < Decimal::ZERO => Action::Withdraw {
                    source: source.clone(),
                    amount: -delta,
                },
                _ => Action::Deposit {
                    target: target.opportunity().clone(),
                    amount: delta,
                },
            };
            debug!(action = %action, "Rebalance action");
            actions.push(action);
        }

        actions
    }
}

/// Match flattened account balances against feed opportunities.
///
/// A balance matches an opportunity when its symbol equals the opportunity's
/// asset and its platform equals the protocol key. Unmatched or zero
/// balances are skipped.
#[must_use]
pub fn holdings_from_balances(
    balances: &[AccountBalance],
    opportunities: &[Opportunity],
) -> Vec<Holding> {
    balances
        .iter()
        .filter(|b| b.balance > Decimal::ZERO)
        .filter_map(|b| {
            let platform = b.platform.as_deref()?;
            let opportunity = opportunities
                .iter()
                .find(|opp| opp.position_key() == (b.symbol.as_str(), platform))?;
            Holding::new(opportunity.clone(), b.balance).ok()
        })
        .collect()
}
