//! Infrastructure configuration modules.

pub mod chain;
pub mod execution;
pub mod logging;
pub mod portals;
pub mod risk;
pub mod settings;
pub mod strategy;

pub use settings::Config;
