//! Opportunity type with builder pattern.
//!
//! An [`Opportunity`] is a yield-bearing position a protocol currently offers.
//! Instances are immutable; every feed refresh produces fresh values. All
//! construction goes through [`OpportunityBuilder`], which enforces the
//! non-negativity and fraction-bound invariants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::asset::AssetClass;
use super::error::DomainError;

const DEFAULT_CHAIN: &str = "arbitrum";

/// EVM chain ids for the network names the feed reports.
const KNOWN_CHAINS: &[(&str, u64)] = &[
    ("ethereum", 1),
    ("optimism", 10),
    ("bsc", 56),
    ("polygon", 137),
    ("base", 8453),
    ("arbitrum", 42161),
    ("avalanche", 43114),
];

/// Utilization above this level starts eating into the risk-adjusted APY.
const UTILIZATION_KNEE: Decimal = dec!(0.8);
const UTILIZATION_PENALTY_SLOPE: Decimal = dec!(2.5);

/// A yield opportunity offered by a lending or vault protocol.
///
/// Use `Opportunity::builder()` to construct instances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    protocol: String,
    protocol_key: String,
    asset: String,
    underlying_asset: String,
    asset_address: String,
    apy: Decimal,
    liquidity: Decimal,
    utilization_rate: Decimal,
    collateral_factor: Decimal,
    chain: String,
    chain_id: Option<u64>,
    last_updated: DateTime<Utc>,
}

impl Opportunity {
    /// Create a new builder for constructing an Opportunity.
    #[must_use]
    pub fn builder() -> OpportunityBuilder {
        OpportunityBuilder::new()
    }

    /// Human-readable protocol name (e.g. "Aave V3").
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Stable protocol key (e.g. "aavev3"); used for concentration limits
    /// and withdraw routing.
    #[must_use]
    pub fn protocol_key(&self) -> &str {
        &self.protocol_key
    }

    /// Platform token symbol (e.g. "aArbUSDC").
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Underlying asset symbol (e.g. "USDC").
    #[must_use]
    pub fn underlying_asset(&self) -> &str {
        &self.underlying_asset
    }

    /// Platform token contract address.
    #[must_use]
    pub fn asset_address(&self) -> &str {
        &self.asset_address
    }

    /// Annual percentage yield as a fraction.
    #[must_use]
    pub const fn apy(&self) -> Decimal {
        self.apy
    }

    /// Available liquidity in USD.
    #[must_use]
    pub const fn liquidity(&self) -> Decimal {
        self.liquidity
    }

    #[must_use]
    pub const fn utilization_rate(&self) -> Decimal {
        self.utilization_rate
    }

    #[must_use]
    pub const fn collateral_factor(&self) -> Decimal {
        self.collateral_factor
    }

    /// Network name the opportunity lives on.
    #[must_use]
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Numeric chain id, when the network is known or was set explicitly.
    #[must_use]
    pub const fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Asset class of the underlying asset.
    #[must_use]
    pub fn asset_class(&self) -> AssetClass {
        AssetClass::classify(&self.underlying_asset)
    }

    /// APY discounted for utilization above 80%, floored at zero.
    ///
    /// Every point of utilization above the knee removes 2.5 points of the
    /// headline rate, so a fully utilized market yields half its APY.
    #[must_use]
    pub fn risk_adjusted_apy(&self) -> Decimal {
        let excess = (self.utilization_rate - UTILIZATION_KNEE).max(Decimal::ZERO);
        let adjusted = self.apy * (Decimal::ONE - excess * UTILIZATION_PENALTY_SLOPE);
        adjusted.max(Decimal::ZERO)
    }

    /// Key used to match opportunities against held positions:
    /// `(platform asset symbol, protocol key)`.
    #[must_use]
    pub fn position_key(&self) -> (&str, &str) {
        (&self.asset, &self.protocol_key)
    }
}

/// Builder for constructing `Opportunity` instances.
///
/// # Example
///
/// ```
/// use yieldlord::domain::opportunity::Opportunity;
/// use rust_decimal_macros::dec;
///
/// let opportunity = Opportunity::builder()
///     .protocol("Fluid", "fluid")
///     .asset("fUSDC", "USDC", "0x1A996cb54bb95462040408C06122D45D6Cdb6096")
///     .apy(dec!(0.052))
///     .liquidity(dec!(12500000))
///     .utilization(dec!(0.71))
///     .build()
///     .unwrap();
///
/// assert_eq!(opportunity.position_key(), ("fUSDC", "fluid"));
/// ```
#[derive(Debug, Default)]
pub struct OpportunityBuilder {
    protocol: Option<String>,
    protocol_key: Option<String>,
    asset: Option<String>,
    underlying_asset: Option<String>,
    asset_address: Option<String>,
    apy: Option<Decimal>,
    liquidity: Option<Decimal>,
    utilization_rate: Decimal,
    collateral_factor: Decimal,
    chain: Option<String>,
    chain_id: Option<u64>,
    last_updated: Option<DateTime<Utc>>,
}

impl OpportunityBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the protocol display name and key.
    #[must_use]
    pub fn protocol(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.protocol = Some(name.into());
        self.protocol_key = Some(key.into());
        self
    }

    /// Set the platform token symbol, its underlying asset, and the platform
    /// token contract address.
    #[must_use]
    pub fn asset(
        mut self,
        symbol: impl Into<String>,
        underlying: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.asset = Some(symbol.into());
        self.underlying_asset = Some(underlying.into());
        self.asset_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn apy(mut self, apy: Decimal) -> Self {
        self.apy = Some(apy);
        self
    }

    #[must_use]
    pub fn liquidity(mut self, liquidity: Decimal) -> Self {
        self.liquidity = Some(liquidity);
        self
    }

    #[must_use]
    pub fn utilization(mut self, rate: Decimal) -> Self {
        self.utilization_rate = rate;
        self
    }

    #[must_use]
    pub fn collateral_factor(mut self, factor: Decimal) -> Self {
        self.collateral_factor = factor;
        self
    }

    #[must_use]
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    /// Override the chain id derived from the network name.
    #[must_use]
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    #[must_use]
    pub fn last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }

    /// Build the Opportunity, validating every invariant.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if a required field is missing or empty, APY or
    /// liquidity is negative, or a rate lies outside [0, 1].
    pub fn build(self) -> Result<Opportunity, DomainError> {
        let protocol = non_empty(self.protocol, "protocol")?;
        let protocol_key = non_empty(self.protocol_key, "protocol_key")?;
        let asset = non_empty(self.asset, "asset")?;
        let underlying_asset = non_empty(self.underlying_asset, "underlying_asset")?;
        let asset_address = non_empty(self.asset_address, "asset_address")?;
        let apy = self.apy.ok_or(DomainError::MissingField { field: "apy" })?;
        let liquidity = self
            .liquidity
            .ok_or(DomainError::MissingField { field: "liquidity" })?;

        if apy < Decimal::ZERO {
            return Err(DomainError::NegativeApy { apy });
        }
        if liquidity < Decimal::ZERO {
            return Err(DomainError::NegativeLiquidity { liquidity });
        }
        check_fraction("utilization_rate", self.utilization_rate)?;
        check_fraction("collateral_factor", self.collateral_factor)?;

        let chain = self.chain.unwrap_or_else(|| DEFAULT_CHAIN.to_string());
        let chain_id = self.chain_id.or_else(|| known_chain_id(&chain));

        Ok(Opportunity {
            protocol,
            protocol_key,
            asset,
            underlying_asset,
            asset_address,
            apy,
            liquidity,
            utilization_rate: self.utilization_rate,
            collateral_factor: self.collateral_factor,
            chain,
            chain_id,
            last_updated: self.last_updated.unwrap_or_else(Utc::now),
        })
    }
}

fn known_chain_id(network: &str) -> Option<u64> {
    KNOWN_CHAINS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(network))
        .map(|(_, id)| *id)
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, DomainError> {
    match value {
        None => Err(DomainError::MissingField { field }),
        Some(v) if v.trim().is_empty() => Err(DomainError::EmptyField { field }),
        Some(v) => Ok(v),
    }
}

fn check_fraction(field: &'static str, value: Decimal) -> Result<(), DomainError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(DomainError::RateOutOfBounds { field, value });
    }
    Ok(())
}
