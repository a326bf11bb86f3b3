//! Token metadata port.

use alloy_primitives::Address;

/// Read-only lookup of token addresses, decimals, and platform-token
/// underlyings.
pub trait TokenMetadata: Send + Sync {
    /// Contract address of a token by symbol, if known.
    fn address(&self, symbol: &str) -> Option<Address>;

    /// Decimals of a token by symbol. Unknown tokens default to 18.
    fn decimals(&self, symbol: &str) -> u8;

    /// Underlying symbol of a platform token (e.g. "aArbUSDC" -> "USDC").
    fn underlying(&self, platform_symbol: &str) -> Option<String>;
}
