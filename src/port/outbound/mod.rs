//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as the
//! opportunity API, the transaction builder, chain RPC, and token metadata.

pub mod builder;
pub mod chain;
pub mod feed;
pub mod token;
