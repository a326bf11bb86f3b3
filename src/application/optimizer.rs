//! Allocation optimizer.
//!
//! Turns capital plus a set of opportunities into proportional target
//! allocations, and suggests rotations out of under-yielding holdings.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{Allocation, DomainError, Holding, Migration, Opportunity};

/// APY-weighted allocation policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldOptimizer;

impl YieldOptimizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Split `capital` across `opportunities` by APY share.
    ///
    /// Each opportunity receives `capital * apy / Σ apy`. When every APY is
    /// zero the whole capital goes to the first opportunity in input order.
    /// An empty input yields an empty output.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegativeCapital` if `capital` is negative and
    /// `DomainError::Overflow` if a share cannot be represented.
    pub fn suggest_allocations(
        &self,
        capital: Decimal,
        opportunities: &[Opportunity],
    ) -> Result<Vec<Allocation>, DomainError> {
        if capital < Decimal::ZERO {
            return Err(DomainError::NegativeCapital { capital });
        }
        let Some(first) = opportunities.first() else {
            return Ok(Vec::new());
        };

        let total_apy = opportunities
            .iter()
            .map(Opportunity::apy)
            .try_fold(Decimal::ZERO, Decimal::checked_add)
            .ok_or(DomainError::Overflow { operation: "total apy" })?;

        if total_apy.is_zero() {
            debug!(capital = %capital, "All opportunities yield zero, allocating to first");
            return Ok(vec![Allocation::new(first.clone(), capital)?]);
        }

        let allocations = opportunities
            .iter()
            .map(|opp| {
                let share = capital
                    .checked_mul(opp.apy())
                    .and_then(|weighted| weighted.checked_div(total_apy))
                    .ok_or(DomainError::Overflow { operation: "allocation share" })?;
                Allocation::new(opp.clone(), share)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            capital = %capital,
            count = allocations.len(),
            total_apy = %total_apy,
            "Allocations suggested"
        );
        Ok(allocations)
    }

    /// Suggest moving holdings into strictly better-yielding opportunities.
    ///
    /// Holdings are visited from lowest to highest APY. For each one, the
    /// feed is scanned from highest APY down and the first opportunity with
    /// a different `(asset, protocol)` key is taken if its APY is strictly
    /// higher. Equal APYs keep feed order. The same target may be suggested
    /// for several holdings.
    #[must_use]
    pub fn optimize_yield(&self, holdings: &[Holding], feed: &[Opportunity]) -> Vec<Migration> {
        let mut by_apy_asc: Vec<&Holding> = holdings.iter().collect();
        by_apy_asc.sort_by(|a, b| cmp_apy(a.opportunity(), b.opportunity()));

        let mut by_apy_desc: Vec<&Opportunity> = feed.iter().collect();
        by_apy_desc.sort_by(|a, b| cmp_apy(b, a));

        by_apy_asc
            .into_iter()
            .filter_map(|holding| {
                let best = by_apy_desc
                    .iter()
                    .find(|opp| opp.position_key() != holding.key())?;
                (best.apy() > holding.opportunity().apy()).then(|| Migration {
                    from: holding.clone(),
                    to: (*best).clone(),
                    amount: holding.balance(),
                })
            })
            .collect()
    }
}

fn cmp_apy(a: &Opportunity, b: &Opportunity) -> Ordering {
    a.apy().cmp(&b.apy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn opp(asset: &str, key: &str, apy: Decimal) -> Opportunity {
        Opportunity::builder()
            .protocol(key, key)
            .asset(asset, "USDC", "0x0000000000000000000000000000000000000001")
            .apy(apy)
            .liquidity(dec!(1000000))
            .build()
            .unwrap()
    }

    #[test]
    fn splits_capital_by_apy_share() {
        let opps = vec![opp("A", "p1", dec!(0.02)), opp("B", "p2", dec!(0.08))];
        let allocations = YieldOptimizer::new()
            .suggest_allocations(dec!(10000), &opps)
            .unwrap();

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].amount(), dec!(2000));
        assert_eq!(allocations[1].amount(), dec!(8000));
    }

    #[test]
    fn zero_total_apy_goes_to_first() {
        let opps = vec![opp("A", "p1", dec!(0)), opp("B", "p2", dec!(0))];
        let allocations = YieldOptimizer::new()
            .suggest_allocations(dec!(500), &opps)
            .unwrap();

        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].opportunity().asset(), "A");
        assert_eq!(allocations[0].amount(), dec!(500));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let allocations = YieldOptimizer::new()
            .suggest_allocations(dec!(500), &[])
            .unwrap();
        assert!(allocations.is_empty());
    }

    #[test]
    fn negative_capital_is_rejected() {
        let result = YieldOptimizer::new().suggest_allocations(dec!(-1), &[opp("A", "p", dec!(0.1))]);
        assert_eq!(
            result.unwrap_err(),
            DomainError::NegativeCapital { capital: dec!(-1) }
        );
    }

    #[test]
    fn unrepresentable_share_is_an_error() {
        let opps = vec![opp("A", "p1", dec!(2)), opp("B", "p2", dec!(1))];
        let result = YieldOptimizer::new().suggest_allocations(Decimal::MAX, &opps);
        assert_eq!(
            result.unwrap_err(),
            DomainError::Overflow { operation: "allocation share" }
        );
    }

    #[test]
    fn rotation_picks_strictly_better_different_key() {
        let holdings = vec![Holding::new(opp("aArbUSDC", "aavev3", dec!(0.03)), dec!(1000)).unwrap()];
        let feed = vec![
            opp("aArbUSDC", "aavev3", dec!(0.09)),
            opp("fUSDC", "fluid", dec!(0.05)),
            opp("fUSDT", "fluid", dec!(0.04)),
        ];

        let migrations = YieldOptimizer::new().optimize_yield(&holdings, &feed);

        // The same-key entry is skipped even though it has the highest APY.
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].to.asset(), "fUSDC");
        assert_eq!(migrations[0].amount, dec!(1000));
    }

    #[test]
    fn rotation_skips_when_nothing_beats_holding() {
        let holdings = vec![Holding::new(opp("fUSDC", "fluid", dec!(0.05)), dec!(10)).unwrap()];
        let feed = vec![opp("aArbUSDC", "aavev3", dec!(0.05))];

        assert!(YieldOptimizer::new().optimize_yield(&holdings, &feed).is_empty());
    }

    #[test]
    fn rotation_ties_keep_feed_order() {
        let holdings = vec![Holding::new(opp("X", "p0", dec!(0.01)), dec!(10)).unwrap()];
        let feed = vec![opp("first", "p1", dec!(0.05)), opp("second", "p2", dec!(0.05))];

        let migrations = YieldOptimizer::new().optimize_yield(&holdings, &feed);
        assert_eq!(migrations[0].to.asset(), "first");
    }

    #[test]
    fn rotation_visits_lowest_apy_holding_first() {
        let holdings = vec![
            Holding::new(opp("H2", "p2", dec!(0.04)), dec!(20)).unwrap(),
            Holding::new(opp("H1", "p1", dec!(0.01)), dec!(10)).unwrap(),
        ];
        let feed = vec![opp("T", "pt", dec!(0.06))];

        let migrations = YieldOptimizer::new().optimize_yield(&holdings, &feed);
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].from.opportunity().asset(), "H1");
        assert_eq!(migrations[1].from.opportunity().asset(), "H2");
    }
}
