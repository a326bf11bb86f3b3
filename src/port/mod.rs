//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (opportunity APIs, chain RPC nodes, wallets, token tables).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Portals │            │  EVM RPC +  │              │  Token    │
//! │ Adapter │            │  Signer     │              │  Registry │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::feed`] - Opportunity discovery and account balances
//! - [`outbound::builder`] - Deposit transaction building
//! - [`outbound::chain`] - Chain RPC and local signing
//! - [`outbound::token`] - Static token metadata
//! - [`inbound::executor`] - Action execution, driven by the decision cycle

pub mod inbound;
pub mod outbound;
