//! Data Contract Models
//!
//! Layered like the other backend crates:
//! - `domain/` - entities, value objects and the [`Contract`] seam
//! - `compat/` - versioned record layout and migrations
//! - `codec/` - JSON, YAML and storage-native formats
//! - `application/` - configuration and the [`Contracts`] facade
//!
//! ## Guarantees
//! - an entity value that exists has passed every field and cross-field check
//! - `decode(encode(e)) == e` for every entity and every format
//! - stored records of older schema versions upgrade, or fail as a whole
//!
//! Nothing here performs I/O.

pub mod application;
pub mod codec;
pub mod compat;
pub mod domain;

// Re-exports for convenience
pub use application::{Contracts, ContractsConfig};
pub use codec::{Codec, Format, JsonFormat, StorageFormat, YamlFormat, fingerprint};
pub use compat::{MigrationRegistry, Versioned, VersionedEnvelope};
pub use domain::{Contract, EntityType, WriteContext};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    contract_error::{ContractError, ContractResult},
    decode::DecodeError,
    kind::ErrorKind,
    migration::MigrationError,
    validation::{Constraint, ValidationError, Violation},
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

#[cfg(test)]
mod tests;
