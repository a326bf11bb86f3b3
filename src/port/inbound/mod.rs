//! Inbound ports (driving side): interfaces the decision cycle calls into.

pub mod executor;
