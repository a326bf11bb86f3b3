//! EVM chain access: JSON-RPC client and local signer.

pub mod rpc;
pub mod signer;

pub use rpc::EvmRpc;
pub use signer::LocalSigner;
