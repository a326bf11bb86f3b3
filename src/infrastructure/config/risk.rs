//! Risk limiter configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::risk::RiskProfile;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Largest share of capital any one protocol may receive, in (0, 1].
    #[serde(default = "default_max_per_protocol")]
    pub max_per_protocol: Decimal,
}

fn default_max_per_protocol() -> Decimal {
    dec!(0.3)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_per_protocol: default_max_per_protocol(),
        }
    }
}

impl TryFrom<&RiskConfig> for RiskProfile {
    type Error = ConfigError;

    fn try_from(config: &RiskConfig) -> Result<Self, Self::Error> {
        Self::new(config.max_per_protocol).map_err(|e| ConfigError::InvalidValue {
            field: "max_per_protocol",
            reason: e.to_string(),
        })
    }
}
