//! Risk limiter and advisory risk scoring.
//!
//! [`RiskLimiter::enforce_limits`] clips allocations to per-protocol
//! concentration caps. [`RiskLimiter::assess_risk`] scores holdings. The two
//! are independent read-only views: scores never feed back into clipping.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::allocation::total_amount;
use crate::domain::{Allocation, AssetClass, DomainError, Holding, Opportunity};

/// Concentration limits applied to target allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskProfile {
    max_per_protocol: Decimal,
}

impl RiskProfile {
    /// Create a profile capping each protocol at `max_per_protocol` of total
    /// capital.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConcentrationLimit` unless the limit is
    /// in (0, 1].
    pub fn new(max_per_protocol: Decimal) -> Result<Self, DomainError> {
        if max_per_protocol <= Decimal::ZERO || max_per_protocol > Decimal::ONE {
            return Err(DomainError::InvalidConcentrationLimit {
                value: max_per_protocol,
            });
        }
        Ok(Self { max_per_protocol })
    }

    #[must_use]
    pub const fn max_per_protocol(&self) -> Decimal {
        self.max_per_protocol
    }
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            max_per_protocol: dec!(0.3),
        }
    }
}

/// Advisory risk score for one holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub holding: Holding,
    pub asset_class: AssetClass,
    /// Asset-class weight plus protocol weight; lower is safer.
    pub score: u8,
}

/// Applies a [`RiskProfile`] to allocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskLimiter {
    profile: RiskProfile,
}

impl RiskLimiter {
    #[must_use]
    pub const fn new(profile: RiskProfile) -> Self {
        Self { profile }
    }

    #[must_use]
    pub const fn profile(&self) -> &RiskProfile {
        &self.profile
    }

    /// Clip allocations so no protocol exceeds `max_per_protocol` of the
    /// total input amount.
    ///
    /// Allocations are served first come, first served in input order: each
    /// receives `min(requested, cap - already committed to its protocol)`.
    /// Later allocations on a saturated protocol are dropped rather than
    /// emitted at zero. This is a greedy policy, not a global optimum.
    #[must_use]
    pub fn enforce_limits(&self, allocations: Vec<Allocation>) -> Vec<Allocation> {
        let total = total_amount(&allocations);
        let cap = self.profile.max_per_protocol * total;
        let mut committed: HashMap<String, Decimal> = HashMap::new();
        let mut out = Vec::with_capacity(allocations.len());

        for allocation in allocations {
            let used = committed
                .get(allocation.protocol_key())
                .copied()
                .unwrap_or(Decimal::ZERO);
            let remaining = cap - used;
            let requested = allocation.amount();
            let granted = requested.min(remaining);

            if granted <= Decimal::ZERO {
                debug!(
                    protocol = allocation.protocol_key(),
                    asset = allocation.opportunity().asset(),
                    requested = %requested,
                    "Allocation dropped, protocol cap exhausted"
                );
                continue;
            }
            if granted < requested {
                info!(
                    protocol = allocation.protocol_key(),
                    asset = allocation.opportunity().asset(),
                    requested = %requested,
                    granted = %granted,
                    "Allocation clipped to protocol cap"
                );
            }

            *committed
                .entry(allocation.protocol_key().to_string())
                .or_insert(Decimal::ZERO) += granted;
            out.push(allocation.clipped_to(granted));
        }

        out
    }

    /// Score each holding by asset class and protocol.
    ///
    /// When `market_data` carries an opportunity with the holding's key, the
    /// fresher snapshot is used for classification.
    #[must_use]
    pub fn assess_risk(
        &self,
        holdings: &[Holding],
        market_data: &[Opportunity],
    ) -> Vec<RiskAssessment> {
        holdings
            .iter()
            .map(|holding| {
                let current = market_data
                    .iter()
                    .find(|opp| opp.position_key() == holding.key())
                    .map_or_else(|| holding.clone(), |opp| holding.clone().with_opportunity(opp.clone()));
                let opportunity = current.opportunity();
                let asset_class = opportunity.asset_class();
                let score =
                    asset_class_weight(asset_class) + protocol_weight(opportunity.protocol_key());
                RiskAssessment {
                    holding: current,
                    asset_class,
                    score,
                }
            })
            .collect()
    }
}

const fn asset_class_weight(class: AssetClass) -> u8 {
    match class {
        AssetClass::Stablecoin => 1,
        AssetClass::EthCorrelated | AssetClass::BtcCorrelated => 2,
        AssetClass::Other => 3,
    }
}

/// Protocol risk: Aave 1, Compound/Fluid/Radiant 2, anything else 3.
/// Versioned keys ("aavev3", "compoundv3") score like their family.
fn protocol_weight(protocol_key: &str) -> u8 {
    let key = protocol_key.to_ascii_lowercase();
    if key.starts_with("aave") {
        1
    } else if ["compound", "fluid", "radiant"]
        .iter()
        .any(|family| key.starts_with(family))
    {
        2
    } else {
        3
    }
}
