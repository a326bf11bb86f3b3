//! Opportunity feed port.
//!
//! The feed is an opaque data source returning opportunity records. It also
//! exposes the wallet's current balances so holdings can be reconstructed
//! without local state.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::Opportunity;
use crate::error::FeedError;

/// Filters applied server-side when fetching opportunities.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    /// Network name (e.g. "arbitrum").
    pub network: String,
    /// Platform keys to include; empty means all.
    pub platforms: Vec<String>,
    /// Minimum liquidity in USD.
    pub min_liquidity: Option<Decimal>,
    /// Minimum APY as a fraction.
    pub min_apy: Option<Decimal>,
    /// Maximum number of records.
    pub limit: usize,
}

impl FeedQuery {
    #[must_use]
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            platforms: Vec::new(),
            min_liquidity: None,
            min_apy: None,
            limit: 50,
        }
    }
}

/// One balance line from an account snapshot.
///
/// Nested balances are already flattened and inherit their parent's
/// platform and network when they carry none of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub symbol: String,
    pub platform: Option<String>,
    pub network: Option<String>,
    pub address: Option<String>,
    pub balance: Decimal,
}

/// Source of yield opportunities.
#[async_trait]
pub trait OpportunityFeed: Send + Sync {
    /// Fetch opportunities, sorted by APY descending.
    async fn fetch_opportunities(&self, query: &FeedQuery)
        -> Result<Vec<Opportunity>, FeedError>;
}

/// Source of wallet balances.
#[async_trait]
pub trait AccountBalances: Send + Sync {
    /// Fetch the flattened balances of `owner` on the given networks.
    async fn fetch_balances(
        &self,
        owner: &str,
        networks: &[String],
    ) -> Result<Vec<AccountBalance>, FeedError>;
}
