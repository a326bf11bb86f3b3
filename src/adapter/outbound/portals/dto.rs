//! Portals API request and response types.
//!
//! Numeric fields arrive as JSON numbers or strings depending on the
//! endpoint, so they are kept as raw values and parsed leniently.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /tokens` envelope. Items stay raw so one bad record cannot fail the
/// whole page.
#[derive(Debug, Deserialize)]
pub struct TokensResponse {
    #[serde(default)]
    pub tokens: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenItem {
    pub symbol: Option<String>,
    pub platform: Option<String>,
    pub platform_key: Option<String>,
    pub address: Option<String>,
    pub network: Option<String>,
    pub key: Option<String>,
    pub liquidity: Option<Value>,
    #[serde(default)]
    pub metrics: TokenMetrics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    pub apy: Option<Value>,
    pub utilization: Option<Value>,
    pub collateral_factor: Option<Value>,
}

/// `POST /portal` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalBody {
    pub sender: String,
    pub network: String,
    pub input_token: String,
    /// Base units, as a decimal string.
    pub input_amount: String,
    pub output_token: String,
    pub slippage_tolerance: String,
    pub validate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalResponse {
    pub tx: Option<PortalTx>,
    pub output_amount: Option<Value>,
    pub gas_estimate: Option<Value>,
    #[serde(default)]
    pub route: Vec<Value>,
    pub success: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PortalTx {
    pub to: Option<String>,
    pub data: Option<String>,
    pub value: Option<Value>,
}

/// `GET /account` envelope.
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    #[serde(default)]
    pub balances: Vec<BalanceItem>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceItem {
    pub symbol: Option<String>,
    pub platform: Option<String>,
    pub network: Option<String>,
    pub address: Option<String>,
    pub balance: Option<Value>,
    #[serde(default)]
    pub tokens: Vec<BalanceItem>,
}

/// Parse a JSON number or numeric string. Null and empty strings are `None`.
///
/// # Errors
///
/// Returns a description of the value if it is not numeric.
pub fn decimal_value(value: Option<&Value>) -> Result<Option<Decimal>, String> {
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("expected number, got {other}")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| format!("invalid number {text:?}: {e}"))
}

/// Render a JSON value as plain text (strings without quotes).
#[must_use]
pub fn text_value(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}
