//! Builders for domain primitives used across tests.

use alloy_primitives::{keccak256, Address};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::adapter::outbound::token::TokenRegistry;
use crate::domain::{Allocation, Holding, Opportunity};

/// Deterministic address derived from `label`.
pub fn address_for(label: &str) -> Address {
    Address::from_word(keccak256(label.as_bytes()))
}

/// Opportunity with key and name `protocol_key`, a derived contract address,
/// and 1M liquidity. The underlying comes from the token registry when the
/// symbol is known.
pub fn opportunity(protocol_key: &str, asset: &str, apy: Decimal) -> Opportunity {
    let underlying = TokenRegistry::arbitrum()
        .underlying_of(asset)
        .unwrap_or(asset);
    Opportunity::builder()
        .protocol(protocol_key, protocol_key)
        .asset(asset, underlying, address_for(asset).to_string())
        .apy(apy)
        .liquidity(dec!(1000000))
        .build()
        .expect("valid test opportunity")
}

/// Like [`opportunity`] with a utilization rate.
pub fn opportunity_with_utilization(
    protocol_key: &str,
    asset: &str,
    apy: Decimal,
    utilization: Decimal,
) -> Opportunity {
    let base = opportunity(protocol_key, asset, apy);
    Opportunity::builder()
        .protocol(base.protocol(), base.protocol_key())
        .asset(base.asset(), base.underlying_asset(), base.asset_address())
        .apy(apy)
        .liquidity(base.liquidity())
        .utilization(utilization)
        .build()
        .expect("valid test opportunity")
}

pub fn holding(opportunity: &Opportunity, balance: Decimal) -> Holding {
    Holding::new(opportunity.clone(), balance).expect("valid test holding")
}

pub fn allocation(opportunity: &Opportunity, amount: Decimal) -> Allocation {
    Allocation::new(opportunity.clone(), amount).expect("valid test allocation")
}
