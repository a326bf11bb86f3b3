//! Asset classification used by risk scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad economic class of an underlying asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// USD-pegged stablecoins.
    Stablecoin,
    /// ETH and its liquid-staking derivatives.
    EthCorrelated,
    /// Wrapped or tokenized bitcoin.
    BtcCorrelated,
    /// Anything not recognized above.
    Other,
}

const STABLECOINS: &[&str] = &[
    "USDC", "USDT", "DAI", "FRAX", "LUSD", "GHO", "USDD", "TUSD", "MIM",
];
const ETH_CORRELATED: &[&str] = &["ETH", "WETH", "STETH", "WSTETH", "RETH", "WEETH", "ARB"];
const BTC_CORRELATED: &[&str] = &["BTC", "WBTC", "TBTC"];

impl AssetClass {
    /// Classify an underlying asset by symbol (case-insensitive).
    #[must_use]
    pub fn classify(symbol: &str) -> Self {
        let upper = symbol.to_ascii_uppercase();
        let upper = upper.as_str();
        if STABLECOINS.contains(&upper) {
            Self::Stablecoin
        } else if ETH_CORRELATED.contains(&upper) {
            Self::EthCorrelated
        } else if BTC_CORRELATED.contains(&upper) {
            Self::BtcCorrelated
        } else {
            Self::Other
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stablecoin => "stablecoin",
            Self::EthCorrelated => "eth_correlated",
            Self::BtcCorrelated => "btc_correlated",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
