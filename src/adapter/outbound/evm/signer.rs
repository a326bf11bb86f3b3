//! Local private-key signer.

use std::fmt;
use std::str::FromStr;

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, TxKind};
use alloy_signer_local::PrivateKeySigner;

use crate::domain::TxHash;
use crate::error::{ConfigError, ExecutionError};
use crate::port::outbound::chain::{SignedTx, TxSigner, UnsignedTx};

/// Signs legacy transactions with an in-memory key.
pub struct LocalSigner {
    signer: PrivateKeySigner,
}

impl LocalSigner {
    /// Parse a hex private key, with or without `0x`. The chain id is taken
    /// from each transaction.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the key is not a valid
    /// secp256k1 secret.
    pub fn from_private_key(key: &str) -> Result<Self, ConfigError> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer = PrivateKeySigner::from_str(key).map_err(|e| ConfigError::InvalidValue {
            field: "wallet.private_key",
            reason: e.to_string(),
        })?;
        Ok(Self { signer })
    }
}

// Never print key material.
impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl TxSigner for LocalSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx, ExecutionError> {
        let mut legacy = TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            input: tx.data.clone(),
        };
        let signature = TxSignerSync::sign_transaction_sync(&self.signer, &mut legacy)
            .map_err(|e| ExecutionError::Signing(e.to_string()))?;
        let envelope: TxEnvelope = legacy.into_signed(signature).into();
        let hash = *envelope.tx_hash();

        Ok(SignedTx {
            raw: envelope.encoded_2718().into(),
            hash: TxHash::new(hash.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256, Bytes, U256};

    // Well-known development key (anvil account 0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn unsigned(nonce: u64) -> UnsignedTx {
        on_chain(42161, nonce)
    }

    fn on_chain(chain_id: u64, nonce: u64) -> UnsignedTx {
        UnsignedTx {
            chain_id,
            nonce,
            gas_price: 10_000_000,
            gas_limit: 300_000,
            to: address!("794a61358D6845594F94dc1DB02A252b5b4814aD"),
            value: U256::ZERO,
            data: Bytes::from_static(&[0x69, 0x32, 0x8d, 0xec]),
        }
    }

    #[test]
    fn derives_address_from_key() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert!(!format!("{signer:?}").contains("ac0974"));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(LocalSigner::from_private_key("0x1234").is_err());
        assert!(LocalSigner::from_private_key("").is_err());
    }

    #[test]
    fn hash_is_keccak_of_raw_encoding() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        let signed = signer.sign(&unsigned(7)).unwrap();

        assert!(!signed.raw.is_empty());
        assert_eq!(signed.hash.as_str(), keccak256(&signed.raw).to_string());
    }

    #[test]
    fn different_nonces_produce_different_hashes() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        let a = signer.sign(&unsigned(1)).unwrap();
        let b = signer.sign(&unsigned(2)).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn chain_id_comes_from_the_transaction() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        let arbitrum = signer.sign(&on_chain(42161, 3)).unwrap();
        let mainnet = signer.sign(&on_chain(1, 3)).unwrap();

        assert_ne!(arbitrum.raw, mainnet.raw);
        assert_ne!(arbitrum.hash, mainnet.hash);
    }
}
