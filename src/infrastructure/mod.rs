//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`retry`] - Bounded retry with exponential backoff

pub mod bootstrap;
pub mod config;
pub mod retry;
