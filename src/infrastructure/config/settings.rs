//! Application configuration loading and validation.
//!
//! [`Config`] aggregates every section of the TOML file. Secrets are never
//! read from the file: `WALLET_PRIVATE_KEY` and `PORTALS_API_KEY` come from
//! the environment.
//!
//! # Example
//!
//! ```no_run
//! use yieldlord::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use super::chain::{ChainConfig, WalletConfig};
use super::execution::ExecutionConfig;
use super::logging::LoggingConfig;
use super::portals::{FeedConfig, PortalsConfig};
use super::risk::RiskConfig;
use super::strategy::StrategyConfig;
use crate::application::risk::RiskProfile;
use crate::error::{ConfigError, Result};

pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
pub const PORTALS_API_KEY_ENV: &str = "PORTALS_API_KEY";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portals: PortalsConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Per-protocol concentration cap.
    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Logging and tracing configuration.
    pub logging: LoggingConfig,

    /// Populated from the environment only.
    #[serde(skip)]
    pub wallet: WalletConfig,
}

impl Config {
    /// Parse configuration from TOML content, overlaying secrets from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Like [`Config::parse_toml`] with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_env<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        config.wallet.private_key = non_empty(WALLET_PRIVATE_KEY_ENV);
        config.portals.api_key = non_empty(PORTALS_API_KEY_ENV);

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing with the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Risk profile described by `[risk]`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the cap is outside (0, 1].
    pub fn risk_profile(&self) -> std::result::Result<RiskProfile, ConfigError> {
        RiskProfile::try_from(&self.risk)
    }

    /// Private key, required only when transactions will be signed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when `WALLET_PRIVATE_KEY` is unset.
    pub fn private_key(&self) -> std::result::Result<&str, ConfigError> {
        self.wallet
            .private_key
            .as_deref()
            .ok_or(ConfigError::MissingField {
                field: WALLET_PRIVATE_KEY_ENV,
            })
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        check_url("portals.api_url", &self.portals.api_url)?;
        check_url("chain.rpc_url", &self.chain.rpc_url)?;
        if self.portals.network.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "portals.network",
            }
            .into());
        }
        if self.portals.max_attempts == 0 {
            return Err(invalid("portals.max_attempts", "must be at least 1"));
        }
        if self.chain.chain_id == 0 {
            return Err(invalid("chain.chain_id", "must be greater than 0"));
        }

        if self.feed.limit == 0 {
            return Err(invalid("feed.limit", "must be greater than 0"));
        }
        if self.feed.min_liquidity_usd < Decimal::ZERO {
            return Err(invalid("feed.min_liquidity_usd", "must be 0 or greater"));
        }
        if self.feed.min_apy < Decimal::ZERO {
            return Err(invalid("feed.min_apy", "must be 0 or greater"));
        }

        self.risk_profile()?;

        let execution = &self.execution;
        if execution.slippage_tolerance < Decimal::ZERO
            || execution.slippage_tolerance > Decimal::ONE_HUNDRED
        {
            return Err(invalid(
                "execution.slippage_tolerance",
                "must be a percentage between 0 and 100",
            ));
        }
        if execution.confirmation_timeout_secs == 0 {
            return Err(invalid(
                "execution.confirmation_timeout_secs",
                "must be greater than 0",
            ));
        }
        if execution.poll_interval_ms == 0 {
            return Err(invalid("execution.poll_interval_ms", "must be greater than 0"));
        }
        if execution.max_attempts == 0 {
            return Err(invalid("execution.max_attempts", "must be at least 1"));
        }
        execution.settings(&self.portals.network, self.chain.chain_id)?;

        if self.strategy.capital < Decimal::ZERO {
            return Err(invalid("strategy.capital", "must be 0 or greater"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

#[allow(clippy::result_large_err)]
fn check_url(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    Url::parse(value).map_err(|e| invalid(field, &e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = "[logging]\nlevel = \"info\"\n";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse_toml_with_env(MINIMAL, no_env).unwrap();

        assert_eq!(config.portals.network, "arbitrum");
        assert_eq!(config.chain.chain_id, 42161);
        assert_eq!(config.feed.platforms, vec!["aavev3", "fluid"]);
        assert_eq!(config.risk.max_per_protocol, dec!(0.3));
        assert_eq!(config.execution.max_attempts, 3);
        assert!(config.execution.auto_approve);
        assert!(!config.strategy.dry_run);
        assert!(config.wallet.private_key.is_none());
        assert!(config.portals.api_key.is_none());
    }

    #[test]
    fn logging_section_is_required() {
        assert!(Config::parse_toml_with_env("[risk]\nmax_per_protocol = 0.5\n", no_env).is_err());
    }

    #[test]
    fn secrets_come_from_env() {
        let env = |key: &str| match key {
            WALLET_PRIVATE_KEY_ENV => Some("0xabc".to_string()),
            PORTALS_API_KEY_ENV => Some("  ".to_string()),
            _ => None,
        };
        let config = Config::parse_toml_with_env(MINIMAL, env).unwrap();

        assert_eq!(config.private_key().unwrap(), "0xabc");
        assert!(config.portals.api_key.is_none());
    }

    #[test]
    fn missing_private_key_is_reported() {
        let config = Config::parse_toml_with_env(MINIMAL, no_env).unwrap();
        assert!(matches!(
            config.private_key(),
            Err(ConfigError::MissingField { field: WALLET_PRIVATE_KEY_ENV })
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            "[risk]\nmax_per_protocol = 0\n",
            "[risk]\nmax_per_protocol = 1.5\n",
            "[execution]\nslippage_tolerance = -1\n",
            "[execution]\nmax_attempts = 0\n",
            "[execution]\naave_pool = \"0x1234\"\n",
            "[chain]\nrpc_url = \"\"\n",
            "[feed]\nlimit = 0\n",
            "[strategy]\ncapital = -5\n",
        ];
        for case in cases {
            let content = format!("{MINIMAL}{case}");
            assert!(
                Config::parse_toml_with_env(&content, no_env).is_err(),
                "accepted: {case}"
            );
        }
    }
}
