//! Token metadata adapters.

pub mod registry;

pub use registry::{PlatformToken, TokenRegistry};
