//! Portals REST API client.
//!
//! Three endpoints are used:
//! - `GET /tokens` for yield opportunities
//! - `POST /portal` for deposit calldata
//! - `GET /account` for wallet balances
//!
//! Portals reports APY in percent. Opportunities carry it as a fraction, so
//! it is scaled on the way in and `minApy` is scaled back on the way out.
//!
//! Every request goes through the same retry loop. 429 and 5xx responses and
//! transport failures are retried with exponential backoff; anything else is
//! returned at once.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::dto::{
    decimal_value, text_value, AccountResponse, BalanceItem, PortalBody, PortalResponse,
    TokenItem, TokensResponse,
};
use crate::domain::Opportunity;
use crate::error::{ExecutionError, FeedError};
use crate::infrastructure::retry::{retry_async, RetryPolicy};
use crate::port::outbound::builder::{PortalQuote, PortalRequest, TransactionBuilder, TxPayload};
use crate::port::outbound::feed::{AccountBalance, AccountBalances, FeedQuery, OpportunityFeed};
use crate::port::outbound::token::TokenMetadata;

pub const DEFAULT_BASE_URL: &str = "https://api.portals.fi/v2";
const DEFAULT_NETWORK: &str = "arbitrum";
const UNKNOWN_PROTOCOL: &str = "unknown";

/// HTTP client for the Portals API.
pub struct PortalsClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    network: String,
    retry: RetryPolicy,
    tokens: Arc<dyn TokenMetadata>,
}

impl PortalsClient {
    /// Create a client with the default HTTP settings.
    pub fn new(
        base_url: impl Into<String>,
        network: impl Into<String>,
        tokens: Arc<dyn TokenMetadata>,
    ) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            network: network.into(),
            retry: RetryPolicy::default(),
            tokens,
        }
    }

    /// Sent as a bearer token when present.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the HTTP client with one using the given request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Send the request built by `build`, retrying transient failures.
    async fn send_json<T, F>(&self, build: F) -> Result<T, FeedError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        retry_async(self.retry, FeedError::is_transient, |attempt| {
            let request = self.authorize(build());
            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| FeedError::Network(e.to_string()))?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(FeedError::RateLimited { attempts: attempt });
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(FeedError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|e| FeedError::Parse(e.to_string()))
            }
        })
        .await
    }

    fn token_params(query: &FeedQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("networks", query.network.clone()),
            ("limit", query.limit.to_string()),
            ("sortBy", "apy".to_string()),
            ("sortDirection", "desc".to_string()),
        ];
        params.extend(query.platforms.iter().map(|p| ("platforms", p.clone())));
        if let Some(min) = query.min_liquidity {
            params.push(("minLiquidity", min.to_string()));
        }
        if let Some(min) = query.min_apy {
            let percent = (min * Decimal::ONE_HUNDRED).normalize();
            params.push(("minApy", percent.to_string()));
        }
        params
    }
}

#[async_trait]
impl OpportunityFeed for PortalsClient {
    async fn fetch_opportunities(&self, query: &FeedQuery) -> Result<Vec<Opportunity>, FeedError> {
        let url = self.url("/tokens");
        let params = Self::token_params(query);
        debug!(url = %url, ?params, "Fetching opportunities");

        let response: TokensResponse = self
            .send_json(|| self.http.get(&url).query(&params))
            .await?;
        let opportunities = parse_tokens(response.tokens, self.tokens.as_ref());

        info!(
            count = opportunities.len(),
            network = %query.network,
            "Fetched opportunities"
        );
        Ok(opportunities)
    }
}

#[async_trait]
impl TransactionBuilder for PortalsClient {
    async fn build_portal(&self, request: &PortalRequest) -> Result<PortalQuote, ExecutionError> {
        let url = self.url("/portal");
        let body = PortalBody {
            sender: request.sender.to_string(),
            network: request.network.clone(),
            input_token: request.input_token.to_string(),
            input_amount: request.input_amount.to_string(),
            output_token: request.output_token.to_string(),
            slippage_tolerance: request.slippage_tolerance.to_string(),
            validate: true,
            gas_price: request.gas_price.map(|g| g.to_string()),
            gas_limit: request.gas_limit.map(|g| g.to_string()),
        };
        debug!(url = %url, input_amount = %body.input_amount, "Building portal transaction");

        let response: PortalResponse = self
            .send_json(|| self.http.post(&url).json(&body))
            .await?;
        let quote = parse_quote(response)?;

        info!(
            to = %quote.tx.to,
            gas_estimate = quote.gas_estimate,
            simulation_success = quote.simulation_success,
            "Portal transaction built"
        );
        Ok(quote)
    }
}

#[async_trait]
impl AccountBalances for PortalsClient {
    async fn fetch_balances(
        &self,
        owner: &str,
        networks: &[String],
    ) -> Result<Vec<AccountBalance>, FeedError> {
        let url = self.url("/account");
        let networks = if networks.is_empty() {
            self.network.clone()
        } else {
            networks.join(",")
        };
        let params = [("owner", owner.to_string()), ("networks", networks)];
        debug!(url = %url, owner, "Fetching account balances");

        let response: AccountResponse = self
            .send_json(|| self.http.get(&url).query(&params))
            .await?;
        let balances = flatten_balances(&response.balances);

        info!(owner, count = balances.len(), "Fetched account balances");
        Ok(balances)
    }
}

/// Turn raw `/tokens` items into opportunities. Malformed items are logged
/// and skipped.
pub fn parse_tokens(items: Vec<Value>, tokens: &dyn TokenMetadata) -> Vec<Opportunity> {
    items
        .into_iter()
        .filter_map(|raw| match parse_token(raw, tokens) {
            Ok(opportunity) => Some(opportunity),
            Err(reason) => {
                warn!(reason = %reason, "Skipping opportunity record");
                None
            }
        })
        .collect()
}

fn parse_token(raw: Value, tokens: &dyn TokenMetadata) -> Result<Opportunity, String> {
    let item: TokenItem =
        serde_json::from_value(raw).map_err(|e| format!("malformed record: {e}"))?;
    let symbol = item
        .symbol
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing symbol".to_string())?;

    let underlying = tokens.underlying(&symbol).unwrap_or_else(|| {
        debug!(symbol = %symbol, "No underlying mapping, using symbol");
        symbol.clone()
    });
    let protocol = item.platform.unwrap_or_else(|| UNKNOWN_PROTOCOL.to_string());
    let protocol_key = item.platform_key.unwrap_or_else(|| protocol.clone());
    let zero = |v: Option<Decimal>| v.unwrap_or_default();

    Opportunity::builder()
        .protocol(protocol, protocol_key)
        .asset(symbol.clone(), underlying, item.address.unwrap_or_default())
        .apy(zero(decimal_value(item.metrics.apy.as_ref())?) / Decimal::ONE_HUNDRED)
        .liquidity(zero(decimal_value(item.liquidity.as_ref())?))
        .utilization(zero(decimal_value(item.metrics.utilization.as_ref())?))
        .collateral_factor(zero(decimal_value(item.metrics.collateral_factor.as_ref())?))
        .chain(item.network.unwrap_or_else(|| DEFAULT_NETWORK.to_string()))
        .build()
        .map_err(|e| format!("{symbol}: {e}"))
}

/// Validate a `/portal` response.
///
/// # Errors
///
/// Returns `ExecutionError::TransactionBuild` if the payload, output
/// estimate, or gas estimate is missing or malformed.
pub fn parse_quote(response: PortalResponse) -> Result<PortalQuote, ExecutionError> {
    let incomplete = |what: &str| ExecutionError::TransactionBuild(format!("portal response missing {what}"));

    let tx = response.tx.ok_or_else(|| incomplete("tx"))?;
    let output_amount = response
        .output_amount
        .as_ref()
        .map(text_value)
        .ok_or_else(|| incomplete("outputAmount"))?;
    let gas_estimate = response
        .gas_estimate
        .as_ref()
        .map(text_value)
        .ok_or_else(|| incomplete("gasEstimate"))?;
    let gas_estimate = if gas_estimate.is_empty() {
        0
    } else {
        gas_estimate.parse::<u64>().map_err(|e| {
            ExecutionError::TransactionBuild(format!("invalid gasEstimate {gas_estimate:?}: {e}"))
        })?
    };

    let to = tx.to.ok_or_else(|| incomplete("tx.to"))?;
    let to = Address::from_str(&to)
        .map_err(|e| ExecutionError::TransactionBuild(format!("invalid tx.to {to:?}: {e}")))?;
    let data = tx.data.ok_or_else(|| incomplete("tx.data"))?;
    let data = Bytes::from_str(&data)
        .map_err(|e| ExecutionError::TransactionBuild(format!("invalid tx.data: {e}")))?;
    let value = match tx.value.as_ref().map(text_value) {
        None => U256::ZERO,
        Some(v) if v.is_empty() => U256::ZERO,
        Some(v) => U256::from_str(&v)
            .map_err(|e| ExecutionError::TransactionBuild(format!("invalid tx.value {v:?}: {e}")))?,
    };

    Ok(PortalQuote {
        tx: TxPayload { to, data, value },
        output_amount,
        gas_estimate,
        route: response.route.iter().map(text_value).collect(),
        simulation_success: response.success.unwrap_or(true),
    })
}

/// Flatten nested balance entries. Children inherit platform and network
/// from their parent when they carry none.
#[must_use]
pub fn flatten_balances(items: &[BalanceItem]) -> Vec<AccountBalance> {
    let mut out = Vec::new();
    for item in items {
        flatten_into(item, None, None, &mut out);
    }
    out
}

fn flatten_into(
    item: &BalanceItem,
    platform: Option<&str>,
    network: Option<&str>,
    out: &mut Vec<AccountBalance>,
) {
    let platform = item.platform.as_deref().or(platform);
    let network = item.network.as_deref().or(network);

    match (&item.symbol, decimal_value(item.balance.as_ref())) {
        (Some(symbol), Ok(balance)) => out.push(AccountBalance {
            symbol: symbol.clone(),
            platform: platform.map(str::to_string),
            network: network.map(str::to_string),
            address: item.address.clone(),
            balance: balance.unwrap_or_default(),
        }),
        (Some(symbol), Err(reason)) => {
            warn!(symbol = %symbol, reason = %reason, "Skipping balance entry");
        }
        (None, _) => {}
    }

    for child in &item.tokens {
        flatten_into(child, platform, network, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::token::TokenRegistry;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn registry() -> &'static TokenRegistry {
        TokenRegistry::arbitrum()
    }

    #[test]
    fn parse_tokens_maps_fields() {
        let items = vec![json!({
            "symbol": "fUSDC",
            "platform": "Fluid",
            "platformKey": "fluid",
            "address": "0x1A996cb54bb95462040408C06122D45D6Cdb6096",
            "network": "arbitrum",
            "liquidity": "12500000.5",
            "metrics": { "apy": "5.2", "utilization": 0.71, "collateralFactor": "" }
        })];

        let parsed = parse_tokens(items, registry());

        assert_eq!(parsed.len(), 1);
        let opp = &parsed[0];
        assert_eq!(opp.protocol(), "Fluid");
        assert_eq!(opp.protocol_key(), "fluid");
        assert_eq!(opp.underlying_asset(), "USDC");
        assert_eq!(opp.apy(), dec!(0.052));
        assert_eq!(opp.liquidity(), dec!(12500000.5));
        assert_eq!(opp.utilization_rate(), dec!(0.71));
        assert_eq!(opp.collateral_factor(), dec!(0));
    }

    #[test]
    fn parse_tokens_defaults_and_skips() {
        let items = vec![
            json!({ "symbol": "XYZ", "platform": "morpho", "address": "0x01" }),
            json!({ "platform": "aavev3", "address": "0x02" }),
            json!({ "symbol": "aArbUSDC", "platform": "aavev3", "address": "0x03",
                    "metrics": { "apy": "not-a-number" } }),
            json!({ "symbol": "aArbDAI", "platform": "aavev3", "address": "0x04",
                    "metrics": { "apy": -1 } }),
            json!("garbage"),
        ];

        let parsed = parse_tokens(items, registry());

        assert_eq!(parsed.len(), 1);
        let opp = &parsed[0];
        assert_eq!(opp.protocol_key(), "morpho");
        assert_eq!(opp.underlying_asset(), "XYZ");
        assert_eq!(opp.chain(), "arbitrum");
        assert_eq!(opp.apy(), dec!(0));
    }

    #[test]
    fn reported_percent_becomes_fraction() {
        let items = vec![json!({
            "symbol": "fUSDC",
            "platform": "fluid",
            "address": "0x1A996cb54bb95462040408C06122D45D6Cdb6096",
            "metrics": { "apy": "5.23" }
        })];

        let parsed = parse_tokens(items, registry());

        assert_eq!(parsed[0].apy(), dec!(0.0523));
    }

    #[test]
    fn min_apy_is_sent_as_percent() {
        let mut query = FeedQuery::new("arbitrum");
        query.min_apy = Some(dec!(0.035));

        let params = PortalsClient::token_params(&query);

        assert!(params.contains(&("minApy", "3.5".to_string())));
    }

    fn quote_response(value: Value) -> PortalResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parse_quote_reads_payload() {
        let response = quote_response(json!({
            "tx": {
                "to": "0x794a61358D6845594F94dc1DB02A252b5b4814aD",
                "data": "0xdeadbeef",
                "value": "0"
            },
            "outputAmount": "999500",
            "gasEstimate": 250000,
            "route": ["USDC", "fUSDC"]
        }));

        let quote = parse_quote(response).unwrap();

        assert_eq!(quote.tx.data.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(quote.tx.value, U256::ZERO);
        assert_eq!(quote.output_amount, "999500");
        assert_eq!(quote.gas_estimate, 250_000);
        assert_eq!(quote.route, vec!["USDC", "fUSDC"]);
        assert!(quote.simulation_success);
    }

    #[test]
    fn parse_quote_rejects_incomplete_responses() {
        let missing_gas = quote_response(json!({
            "tx": { "to": "0x794a61358D6845594F94dc1DB02A252b5b4814aD", "data": "0x" },
            "outputAmount": "1"
        }));
        let missing_tx = quote_response(json!({ "outputAmount": "1", "gasEstimate": "1" }));
        let missing_data = quote_response(json!({
            "tx": { "to": "0x794a61358D6845594F94dc1DB02A252b5b4814aD" },
            "outputAmount": "1",
            "gasEstimate": "1"
        }));

        for response in [missing_gas, missing_tx, missing_data] {
            assert!(matches!(
                parse_quote(response),
                Err(ExecutionError::TransactionBuild(_))
            ));
        }
    }

    #[test]
    fn flatten_inherits_parent_context() {
        let response: AccountResponse = serde_json::from_value(json!({
            "balances": [
                { "symbol": "USDC", "network": "arbitrum", "balance": "10" },
                {
                    "symbol": "LP",
                    "platform": "fluid",
                    "network": "arbitrum",
                    "balance": 0,
                    "tokens": [
                        { "symbol": "fUSDC", "balance": "1500.25" },
                        { "symbol": "fDAI", "platform": "other", "balance": "bad" }
                    ]
                }
            ]
        }))
        .unwrap();

        let flat = flatten_balances(&response.balances);

        assert_eq!(flat.len(), 3);
        let child = flat.iter().find(|b| b.symbol == "fUSDC").unwrap();
        assert_eq!(child.platform.as_deref(), Some("fluid"));
        assert_eq!(child.network.as_deref(), Some("arbitrum"));
        assert_eq!(child.balance, dec!(1500.25));
        assert!(flat.iter().all(|b| b.symbol != "fDAI"));
    }

    #[test]
    fn token_params_repeat_platforms() {
        let mut query = FeedQuery::new("arbitrum");
        query.platforms = vec!["aavev3".into(), "fluid".into()];
        query.min_apy = Some(dec!(0.01));

        let params = PortalsClient::token_params(&query);

        let platforms: Vec<_> = params.iter().filter(|(k, _)| *k == "platforms").collect();
        assert_eq!(platforms.len(), 2);
        assert!(params.contains(&("sortBy", "apy".to_string())));
        assert!(params.contains(&("minApy", "1".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "minLiquidity"));
    }

    #[test]
    fn api_key_is_optional() {
        let client = PortalsClient::new("https://api.portals.fi/v2/", "arbitrum", Arc::new(registry()))
            .with_api_key(Some(String::new()));
        assert!(client.api_key.is_none());
        assert_eq!(client.base_url(), "https://api.portals.fi/v2");
    }
}
