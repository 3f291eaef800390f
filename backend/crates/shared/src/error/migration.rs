//! Migration Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// A step met a field combination it cannot map without guessing
    #[error(
        "cannot migrate {entity_type} record from v{from_version}: field `{field}` {reason}"
    )]
    UnmigratableRecord {
        entity_type: String,
        from_version: u32,
        field: String,
        reason: String,
    },

    /// The chain of steps between two versions is incomplete
    #[error("no migration path for {entity_type} from v{from} to v{to}")]
    NoMigrationPath {
        entity_type: String,
        from: u32,
        to: u32,
    },

    #[error("entity type {0} is not registered")]
    UnregisteredEntity(String),
}

/// Failure reported by a single migration step.
///
/// The registry lifts it into [`MigrationError::UnmigratableRecord`] with the
/// entity type and source version filled in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` {reason}")]
pub struct Unmigratable {
    pub field: String,
    pub reason: String,
}

impl Unmigratable {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
