//! Deterministic signer that records what it signs.

use std::sync::Mutex;

use alloy_primitives::{keccak256, Address, Bytes};

use crate::domain::TxHash;
use crate::error::ExecutionError;
use crate::port::outbound::chain::{SignedTx, TxSigner, UnsignedTx};
use crate::testkit::domain::address_for;

/// Produces a stable fake encoding of each transaction.
#[derive(Debug)]
pub struct RecordingSigner {
    address: Address,
    signed: Mutex<Vec<UnsignedTx>>,
    fail: bool,
}

impl Default for RecordingSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSigner {
    pub fn new() -> Self {
        Self {
            address: address_for("wallet"),
            signed: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Signer whose every `sign` call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Transactions signed so far.
    pub fn signed(&self) -> Vec<UnsignedTx> {
        self.signed.lock().expect("signer state").clone()
    }
}

impl TxSigner for RecordingSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx, ExecutionError> {
        if self.fail {
            return Err(ExecutionError::Signing("scripted failure".to_string()));
        }
        self.signed.lock().expect("signer state").push(tx.clone());

        let mut raw = Vec::new();
        raw.extend_from_slice(&tx.chain_id.to_be_bytes());
        raw.extend_from_slice(&tx.nonce.to_be_bytes());
        raw.extend_from_slice(&tx.gas_price.to_be_bytes());
        raw.extend_from_slice(&tx.gas_limit.to_be_bytes());
        raw.extend_from_slice(tx.to.as_slice());
        raw.extend_from_slice(&tx.data);
        let hash = keccak256(&raw);

        Ok(SignedTx {
            raw: Bytes::from(raw),
            hash: TxHash::new(hash.to_string()),
        })
    }
}
