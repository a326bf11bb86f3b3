//! Outbound adapters (driven side).

pub mod evm;
pub mod portals;
pub mod token;
