//! Static token registry for Arbitrum.
//!
//! Built once on first use and read-only afterwards.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use alloy_primitives::Address;

use crate::domain::AssetClass;
use crate::port::outbound::token::TokenMetadata;

const DEFAULT_DECIMALS: u8 = 18;

/// A platform token and what it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformToken {
    pub symbol: &'static str,
    pub underlying: &'static str,
    pub asset_class: AssetClass,
    pub decimals: u8,
}

const PLATFORM_TOKENS: &[PlatformToken] = &[
    // Fluid
    token("fUSDT", "USDT", AssetClass::Stablecoin, 6),
    token("fUSDC", "USDC", AssetClass::Stablecoin, 6),
    token("fDAI", "DAI", AssetClass::Stablecoin, 18),
    token("fWETH", "WETH", AssetClass::EthCorrelated, 18),
    token("fwstETH", "wstETH", AssetClass::EthCorrelated, 18),
    // Aave v3
    token("aArbUSDC", "USDC", AssetClass::Stablecoin, 6),
    token("aArbUSDCn", "USDC", AssetClass::Stablecoin, 6),
    token("aArbUSDT", "USDT", AssetClass::Stablecoin, 6),
    token("aArbDAI", "DAI", AssetClass::Stablecoin, 18),
    token("aArbGHO", "GHO", AssetClass::Stablecoin, 18),
    token("aArbWETH", "WETH", AssetClass::EthCorrelated, 18),
    token("aArbwstETH", "wstETH", AssetClass::EthCorrelated, 18),
    token("aArbWBTC", "WBTC", AssetClass::BtcCorrelated, 8),
];

const ARBITRUM_ADDRESSES: &[(&str, &str)] = &[
    ("USDC", "0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
    ("USDC.e", "0xFF970A61A043b1cA14834A43f5dE4533EBDDb5CC"),
    ("USDT", "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
    ("DAI", "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1"),
    ("WETH", "0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
    ("WBTC", "0x2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f"),
    ("GHO", "0x7dfF72693f6A4149b17e7C6314655f6A9F7c8B33"),
];

const KNOWN_UNDERLYINGS: &[&str] = &["USDC", "USDT", "DAI", "WETH", "WBTC", "GHO", "wstETH", "ETH"];

/// Prefixes tried, in order, when a platform token is not in the table.
const PLATFORM_PREFIXES: &[&str] = &["aArb", "a.e.", "fwst", "a", "c", "f", "r", "y"];

const fn token(
    symbol: &'static str,
    underlying: &'static str,
    asset_class: AssetClass,
    decimals: u8,
) -> PlatformToken {
    PlatformToken {
        symbol,
        underlying,
        asset_class,
        decimals,
    }
}

/// Immutable token lookup tables.
#[derive(Debug)]
pub struct TokenRegistry {
    platform: HashMap<&'static str, PlatformToken>,
    addresses: HashMap<&'static str, Address>,
}

impl TokenRegistry {
    /// Process-wide Arbitrum registry.
    pub fn arbitrum() -> &'static Self {
        static REGISTRY: OnceLock<TokenRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let platform = PLATFORM_TOKENS.iter().map(|t| (t.symbol, *t)).collect();
        let addresses = ARBITRUM_ADDRESSES
            .iter()
            .filter_map(|(symbol, addr)| Address::from_str(addr).ok().map(|a| (*symbol, a)))
            .collect();
        Self {
            platform,
            addresses,
        }
    }

    /// Table entry for a platform token.
    #[must_use]
    pub fn platform_token(&self, symbol: &str) -> Option<&PlatformToken> {
        self.platform.get(symbol)
    }

    /// Underlying of a platform token: table first, then prefix stripping
    /// against the known underlyings.
    #[must_use]
    pub fn underlying_of(&self, platform_symbol: &str) -> Option<&'static str> {
        if let Some(t) = self.platform.get(platform_symbol) {
            return Some(t.underlying);
        }
        PLATFORM_PREFIXES.iter().find_map(|prefix| {
            let rest = platform_symbol.strip_prefix(prefix)?;
            KNOWN_UNDERLYINGS
                .iter()
                .find(|u| u.eq_ignore_ascii_case(rest))
                .copied()
        })
    }

    /// Asset class of an underlying symbol, preferring the table.
    #[must_use]
    pub fn classify(&self, symbol: &str) -> AssetClass {
        PLATFORM_TOKENS
            .iter()
            .find(|t| t.underlying.eq_ignore_ascii_case(symbol))
            .map_or_else(|| AssetClass::classify(symbol), |t| t.asset_class)
    }
}

impl TokenMetadata for TokenRegistry {
    /// Underlying symbols resolve directly; platform tokens resolve to their
    /// underlying's address.
    fn address(&self, symbol: &str) -> Option<Address> {
        if let Some(addr) = self.addresses.get(symbol) {
            return Some(*addr);
        }
        let underlying = self.platform.get(symbol)?.underlying;
        self.addresses.get(underlying).copied()
    }

    fn decimals(&self, symbol: &str) -> u8 {
        if let Some(t) = self.platform.get(symbol) {
            return t.decimals;
        }
        PLATFORM_TOKENS
            .iter()
            .find(|t| t.underlying.eq_ignore_ascii_case(symbol))
            .map_or(DEFAULT_DECIMALS, |t| t.decimals)
    }

    fn underlying(&self, platform_symbol: &str) -> Option<String> {
        self.underlying_of(platform_symbol).map(str::to_string)
    }
}

impl TokenMetadata for &'static TokenRegistry {
    fn address(&self, symbol: &str) -> Option<Address> {
        (**self).address(symbol)
    }

    fn decimals(&self, symbol: &str) -> u8 {
        (**self).decimals(symbol)
    }

    fn underlying(&self, platform_symbol: &str) -> Option<String> {
        (**self).underlying(platform_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_built_once() {
        assert!(std::ptr::eq(TokenRegistry::arbitrum(), TokenRegistry::arbitrum()));
        assert_eq!(TokenRegistry::arbitrum().addresses.len(), ARBITRUM_ADDRESSES.len());
    }

    #[test]
    fn underlying_from_table_then_prefix() {
        let registry = TokenRegistry::arbitrum();
        assert_eq!(registry.underlying_of("aArbUSDCn"), Some("USDC"));
        assert_eq!(registry.underlying_of("fwstETH"), Some("wstETH"));
        // Not in the table: derived by prefix.
        assert_eq!(registry.underlying_of("aArbETH"), Some("ETH"));
        assert_eq!(registry.underlying_of("rWETH"), Some("WETH"));
        assert_eq!(registry.underlying_of("cUSDC"), Some("USDC"));
        assert_eq!(registry.underlying_of("xyzUSDC"), None);
    }

    #[test]
    fn decimals_lookup_and_fallback() {
        let registry = TokenRegistry::arbitrum();
        assert_eq!(registry.decimals("fUSDC"), 6);
        assert_eq!(registry.decimals("USDC"), 6);
        assert_eq!(registry.decimals("WBTC"), 8);
        assert_eq!(registry.decimals("aArbWETH"), 18);
        assert_eq!(registry.decimals("PEPE"), 18);
    }

    #[test]
    fn addresses_resolve_for_underlying_and_platform_tokens() {
        let registry = TokenRegistry::arbitrum();
        let usdc = registry.address("USDC").unwrap();
        assert_eq!(registry.address("aArbUSDC"), Some(usdc));
        assert!(registry.address("USDC.e").is_some());
        assert_eq!(registry.address("wstETH"), None);
    }

    #[test]
    fn classification_prefers_table() {
        let registry = TokenRegistry::arbitrum();
        assert_eq!(registry.classify("wstETH"), AssetClass::EthCorrelated);
        assert_eq!(registry.classify("GHO"), AssetClass::Stablecoin);
        assert_eq!(registry.classify("ARB"), AssetClass::EthCorrelated);
    }
}
