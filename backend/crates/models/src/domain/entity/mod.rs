//! Entity Module
//!
//! Every entity is built through `validate_and_construct(fields)` from a
//! plain `…Fields` value, or read back with `Contract::from_document`. Both
//! paths share one builder, so no route yields an unchecked instance.

pub mod configuration;
pub mod identity;
pub mod run;
pub mod workflow;

use kernel::document::{FieldReader, as_string, as_timestamp};
use kernel::error::validation::{FieldError, ValidationError, Violations};
use kernel::id::Id;
use kernel::primitives::Timestamp;

use crate::domain::value_object::lifecycle::{
    COMPLETED_AT, CREATED_AT, Lifecycle, STARTED_AT, STATUS,
};
use crate::domain::value_object::RunStatus;

pub use configuration::{
    AccessTokenFields, ConfigurationEntity, ConfigurationFields, IdentityReference,
    IdentityReferenceFields, StorageFields, StorageProvider, StorageSettings,
};
pub use identity::{IdentityEntity, IdentityFields};
pub use run::{RunEntity, RunFields};
pub use workflow::{
    CatalogFields, EngineFields, PermissionFields, RunConfig, RunConfigFields, WorkflowEntity,
    WorkflowFields,
};

/// 入力に ID が無ければ新規発行する
pub(crate) fn ensure_id<T>(id: Option<Id<T>>) -> Id<T> {
    id.unwrap_or_default()
}

/// A builder part is `None` only after it recorded a violation.
pub(crate) fn missing(path: &str) -> ValidationError {
    ValidationError::single(path, FieldError::required())
}

/// Raw lifecycle input shared by workflows and runs
#[derive(Debug, Clone, Default)]
pub struct LifecycleFields {
    /// defaults to `pending`
    pub status: Option<String>,
    /// now when absent
    pub created_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl LifecycleFields {
    pub(crate) fn read(reader: &mut FieldReader<'_>) -> Self {
        Self {
            status: reader.optional(STATUS, as_string),
            created_at: reader.optional(CREATED_AT, as_timestamp),
            started_at: reader.optional(STARTED_AT, as_timestamp),
            completed_at: reader.optional(COMPLETED_AT, as_timestamp),
        }
    }

    pub(crate) fn from_lifecycle(lifecycle: &Lifecycle) -> Self {
        Self {
            status: Some(lifecycle.status().code().to_string()),
            created_at: Some(lifecycle.created_at()),
            started_at: lifecycle.started_at(),
            completed_at: lifecycle.completed_at(),
        }
    }

    /// Per-field step: the status code.
    pub(crate) fn status(&self, v: &mut Violations) -> Option<RunStatus> {
        match &self.status {
            Some(code) => v.capture(STATUS, RunStatus::from_code(code)),
            None => Some(RunStatus::default()),
        }
    }

    /// Cross-field step: ordering and status shape.
    pub(crate) fn build(self, status: RunStatus, v: &mut Violations) -> Option<Lifecycle> {
        let created_at = self.created_at.unwrap_or_else(Timestamp::now);
        match Lifecycle::new(status, created_at, self.started_at, self.completed_at) {
            Ok(lifecycle) => Some(lifecycle),
            Err(e) => {
                v.absorb("", e);
                None
            }
        }
    }
}
