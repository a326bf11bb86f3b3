//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for opportunities, holdings, and allocations.
//! - [`chain`] - `ScriptedChain`, a [`ChainClient`](crate::port::outbound::chain::ChainClient)
//!   that records every read and plays back scripted failures and receipts.
//! - [`signer`] - `RecordingSigner`, a deterministic [`TxSigner`](crate::port::outbound::chain::TxSigner).
//! - [`builder`] - `StaticBuilder`, a canned transaction builder.
//! - [`feed`] - Static feed, balances, and a scripted executor.

pub mod builder;
pub mod chain;
pub mod domain;
pub mod feed;
pub mod signer;
