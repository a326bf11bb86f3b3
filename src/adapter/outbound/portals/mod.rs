//! Portals API adapter: opportunity feed, deposit builder, and account
//! balances.

pub mod client;
pub mod dto;

pub use client::{PortalsClient, DEFAULT_BASE_URL};
