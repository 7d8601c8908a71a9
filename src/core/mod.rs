pub mod error;
pub mod types;

pub use error::{Result, RouterError};
pub use types::{ChangeType, EntityType, RoutingDecision};
