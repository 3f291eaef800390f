//! Domain Layer
//!
//! Contains entities, value objects, and the contract trait codecs rely on.

pub mod contract;
pub mod entity;
pub mod value_object;

// Re-exports
pub use contract::{Contract, EntityType, WriteContext};
pub use entity::{ConfigurationEntity, IdentityEntity, RunEntity, WorkflowEntity};
