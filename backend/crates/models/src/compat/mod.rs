//! Compatibility Layer
//!
//! Versioned record layout and the upgrade path from older schema
//! versions to the current one.

pub mod envelope;
pub mod registry;
pub mod steps;

pub use envelope::{Versioned, VersionedEnvelope};
pub use registry::{MigrationRegistry, MigrationRegistryBuilder, MigrationStep, RegistryBuildError};
