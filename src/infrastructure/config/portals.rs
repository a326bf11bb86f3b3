//! Portals API and opportunity feed configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::adapter::outbound::portals::DEFAULT_BASE_URL;
use crate::infrastructure::retry::RetryPolicy;
use crate::port::outbound::feed::FeedQuery;

/// Portals API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalsConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Network name used for feed queries and deposit requests.
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Loaded from `PORTALS_API_KEY` at runtime, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub(crate) fn default_network() -> String {
    "arbitrum".to_string()
}

const fn default_max_attempts() -> usize {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl PortalsConfig {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PortalsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            network: default_network(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

/// Server-side filters for the opportunity feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_min_liquidity_usd")]
    pub min_liquidity_usd: Decimal,
    #[serde(default = "default_min_apy")]
    pub min_apy: Decimal,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_platforms() -> Vec<String> {
    vec!["aavev3".to_string(), "fluid".to_string()]
}

fn default_min_liquidity_usd() -> Decimal {
    dec!(50000)
}

fn default_min_apy() -> Decimal {
    dec!(0.01)
}

const fn default_limit() -> usize {
    50
}

impl FeedConfig {
    /// Feed query for `network` with these filters.
    #[must_use]
    pub fn query(&self, network: &str) -> FeedQuery {
        FeedQuery {
            network: network.to_string(),
            platforms: self.platforms.clone(),
            min_liquidity: Some(self.min_liquidity_usd),
            min_apy: Some(self.min_apy),
            limit: self.limit,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            min_liquidity_usd: default_min_liquidity_usd(),
            min_apy: default_min_apy(),
            limit: default_limit(),
        }
    }
}
