//! Capital and run-mode settings.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyConfig {
    /// Capital to allocate, in the feed's quote currency.
    #[serde(default)]
    pub capital: Decimal,
    /// Evaluate but never submit transactions.
    #[serde(default)]
    pub dry_run: bool,
}
