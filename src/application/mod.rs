//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the allocation pipeline.

pub mod decision;
pub mod execution;
pub mod market;
pub mod optimizer;
pub mod rebalance;
pub mod risk;
