//! Execution pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::execution::{ExecutionSettings, AAVE_V3_POOL_ARBITRUM};
use crate::error::ConfigError;
use crate::infrastructure::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Slippage tolerance in percent (0.5 = 0.5%).
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: Decimal,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Attempts per transaction, counting the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_aave_pool")]
    pub aave_pool: String,
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
}

fn default_slippage_tolerance() -> Decimal {
    dec!(0.5)
}

const fn default_confirmation_timeout_secs() -> u64 {
    120
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_max_attempts() -> usize {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_aave_pool() -> String {
    AAVE_V3_POOL_ARBITRUM.to_string()
}

const fn default_auto_approve() -> bool {
    true
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage_tolerance: default_slippage_tolerance(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            aave_pool: default_aave_pool(),
            auto_approve: default_auto_approve(),
        }
    }
}

impl ExecutionConfig {
    /// Pipeline settings for the given network.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `aave_pool` is not an address.
    pub fn settings(&self, network: &str, chain_id: u64) -> Result<ExecutionSettings, ConfigError> {
        let aave_pool = Address::from_str(&self.aave_pool).map_err(|e| ConfigError::InvalidValue {
            field: "aave_pool",
            reason: e.to_string(),
        })?;
        Ok(ExecutionSettings {
            network: network.to_string(),
            chain_id,
            slippage_tolerance: self.slippage_tolerance,
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            retry: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
            aave_pool,
            auto_approve: self.auto_approve,
        })
    }
}
