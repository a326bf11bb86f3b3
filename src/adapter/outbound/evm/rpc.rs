//! JSON-RPC chain client over HTTP.

use std::str::FromStr;

use alloy_json_rpc::RpcError;
use alloy_network::{Ethereum, ReceiptResponse, TransactionBuilder as _};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::TxHash;
use crate::error::{ChainError, ConfigError};
use crate::port::outbound::chain::{CallRequest, ChainClient, TxReceipt};

/// Chain client backed by an HTTP JSON-RPC endpoint.
pub struct EvmRpc {
    provider: RootProvider<Ethereum>,
    endpoint: Url,
}

impl EvmRpc {
    /// Connect lazily to `rpc_url`. No request is made until first use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the URL does not parse.
    pub fn new(rpc_url: &str) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(rpc_url).map_err(|e| ConfigError::InvalidValue {
            field: "chain.rpc_url",
            reason: e.to_string(),
        })?;
        Ok(Self {
            provider: RootProvider::new_http(endpoint.clone()),
            endpoint,
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(call: &CallRequest) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value)
    }
}

/// Node-side JSON-RPC errors are rejections; everything else never reached a
/// verdict and is a transport failure.
fn classify<E>(err: RpcError<E>) -> ChainError
where
    RpcError<E>: std::fmt::Display,
{
    match err {
        RpcError::ErrorResp(payload) => {
            ChainError::Rejected(format!("{} (code {})", payload.message, payload.code))
        }
        other => ChainError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ChainClient for EvmRpc {
    async fn pending_nonce(&self, address: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(classify)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError> {
        self.provider
            .estimate_gas(Self::request(call))
            .await
            .map_err(classify)
    }

    async fn call(&self, call: &CallRequest) -> Result<Bytes, ChainError> {
        self.provider.call(Self::request(call)).await.map_err(classify)
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(classify)?;
        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, "Raw transaction accepted by node");
        Ok(TxHash::new(hash.to_string()))
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ChainError> {
        let parsed = B256::from_str(hash.as_str())
            .map_err(|e| ChainError::Transport(format!("invalid transaction hash {hash}: {e}")))?;
        let receipt = self
            .provider
            .get_transaction_receipt(parsed)
            .await
            .map_err(classify)?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: hash.clone(),
            success: r.status(),
            block_number: r.block_number(),
            gas_used: r.gas_used(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;

    #[test]
    fn rejects_malformed_url() {
        assert!(matches!(
            EvmRpc::new("not a url"),
            Err(ConfigError::InvalidValue { field: "chain.rpc_url", .. })
        ));
        let rpc = EvmRpc::new("https://arb1.arbitrum.io/rpc").unwrap();
        assert_eq!(rpc.endpoint().host_str(), Some("arb1.arbitrum.io"));
    }

    #[test]
    fn error_responses_are_rejections() {
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        };
        let err: RpcError<String> = RpcError::ErrorResp(payload);
        assert!(matches!(classify(err), ChainError::Rejected(m) if m.contains("execution reverted")));

        let err: RpcError<String> = RpcError::NullResp;
        assert!(matches!(classify(err), ChainError::Transport(_)));
    }
}
