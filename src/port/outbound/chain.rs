//! Chain RPC and signing ports.
//!
//! The chain is treated as an opaque service. Every method that reads live
//! state is expected to hit the node; implementations must not cache nonce
//! or gas price.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::domain::TxHash;
use crate::error::{ChainError, ExecutionError};

/// A call to simulate or estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// A fully populated, unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Signed, RLP-encoded transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub raw: Bytes,
    pub hash: TxHash,
}

/// The parts of a receipt the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    /// `false` when the transaction reverted.
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Chain RPC operations used by the execution pipeline.
///
/// Errors are classified: `ChainError::Transport` when the request may never
/// have reached the node, `ChainError::Rejected` when the node answered with
/// an error.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next nonce for `address`, counting pending transactions.
    async fn pending_nonce(&self, address: Address) -> Result<u64, ChainError>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainError>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError>;

    /// Read-only `eth_call`.
    async fn call(&self, call: &CallRequest) -> Result<Bytes, ChainError>;

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<TxHash, ChainError>;

    /// Receipt for `hash`, or `None` while the transaction is not yet mined.
    async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ChainError>;
}

/// Wallet signing primitive.
pub trait TxSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign and encode a transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::Signing` if the signer rejects it.
    fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx, ExecutionError>;
}
