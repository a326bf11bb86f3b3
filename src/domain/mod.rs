//! Protocol-agnostic portfolio domain.

pub mod action;
pub mod allocation;
pub mod asset;
pub mod error;
pub mod id;
pub mod opportunity;
pub mod position;

pub use action::{Action, Migration};
pub use allocation::Allocation;
pub use asset::AssetClass;
pub use error::DomainError;
pub use id::{PositionId, TxHash};
pub use opportunity::{Opportunity, OpportunityBuilder};
pub use position::{Holding, Position, PositionBook, DUST_THRESHOLD};
