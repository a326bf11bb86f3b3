//! Market analysis over a feed snapshot.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Opportunity;

/// APY distribution across a set of opportunities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApyStats {
    pub mean: Decimal,
    pub median: Decimal,
    pub max: Decimal,
    pub min: Decimal,
}

/// Liquidity distribution across a set of opportunities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidityStats {
    pub total: Decimal,
    pub mean: Decimal,
    pub max: Decimal,
    pub min: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub count: usize,
    pub protocols: Vec<String>,
    pub apy: Option<ApyStats>,
    pub liquidity: Option<LiquidityStats>,
}

/// Read-only helpers over a feed snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketAnalyzer;

impl MarketAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Opportunities matching `predicate`, in input order.
    #[must_use]
    pub fn filter<P>(&self, opportunities: &[Opportunity], predicate: P) -> Vec<Opportunity>
    where
        P: Fn(&Opportunity) -> bool,
    {
        opportunities.iter().filter(|o| predicate(o)).cloned().collect()
    }

    /// Opportunities sorted by `key`, descending when `descending` is set.
    /// The sort is stable.
    #[must_use]
    pub fn sort_by<K, F>(&self, opportunities: &[Opportunity], key: F, descending: bool) -> Vec<Opportunity>
    where
        K: Ord,
        F: Fn(&Opportunity) -> K,
    {
        let mut sorted = opportunities.to_vec();
        sorted.sort_by(|a, b| {
            let ord = key(a).cmp(&key(b));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        sorted
    }

    /// `None` on empty input.
    #[must_use]
    pub fn apy_stats(&self, opportunities: &[Opportunity]) -> Option<ApyStats> {
        let mut apys: Vec<Decimal> = opportunities.iter().map(Opportunity::apy).collect();
        if apys.is_empty() {
            return None;
        }
        apys.sort_by(Decimal::cmp);

        let n = apys.len();
        let median = if n % 2 == 1 {
            apys[n / 2]
        } else {
            (apys[n / 2 - 1] + apys[n / 2]) / Decimal::TWO
        };

        Some(ApyStats {
            mean: sum(&apys) / Decimal::from(n),
            median,
            max: apys[n - 1],
            min: apys[0],
        })
    }

    /// `None` on empty input.
    #[must_use]
    pub fn liquidity_stats(&self, opportunities: &[Opportunity]) -> Option<LiquidityStats> {
        let values: Vec<Decimal> = opportunities.iter().map(Opportunity::liquidity).collect();
        let max = values.iter().copied().max_by(cmp)?;
        let min = values.iter().copied().min_by(cmp)?;
        let total = sum(&values);

        Some(LiquidityStats {
            total,
            mean: total / Decimal::from(values.len()),
            max,
            min,
        })
    }

    #[must_use]
    pub fn summary(&self, opportunities: &[Opportunity]) -> MarketSummary {
        let mut protocols: Vec<String> = opportunities
            .iter()
            .map(|o| o.protocol_key().to_string())
            .collect();
        protocols.sort();
        protocols.dedup();

        MarketSummary {
            count: opportunities.len(),
            protocols,
            apy: self.apy_stats(opportunities),
            liquidity: self.liquidity_stats(opportunities),
        }
    }
}

fn sum(values: &[Decimal]) -> Decimal {
    values.iter().fold(Decimal::ZERO, |acc, v| acc + v)
}

fn cmp(a: &Decimal, b: &Decimal) -> Ordering {
    a.cmp(b)
}
