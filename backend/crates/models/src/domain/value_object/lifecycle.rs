//! Lifecycle Value Object
//!
//! Status and timestamps of a unit of work.
//!
//! ## 不変条件
//! - `created_at <= started_at <= completed_at` (when present)
//! - `pending`: no start, no completion
//! - `running`: started, not completed
//! - `succeeded` / `failed`: started and completed
//! - `cancelled`: completed (it may never have started)
//!
//! Out-of-order timestamps are rejected, never clamped.

use bson::Document;
use kernel::document::insert_some;
use kernel::error::validation::{Constraint, FieldError, ValidationError, Violations};
use kernel::primitives::{PrimitiveAdapter, Timestamp};

use super::run_status::RunStatus;

pub const STATUS: &str = "status";
pub const CREATED_AT: &str = "created_at";
pub const STARTED_AT: &str = "started_at";
pub const COMPLETED_AT: &str = "completed_at";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lifecycle {
    status: RunStatus,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
}

impl Lifecycle {
    pub fn new(
        status: RunStatus,
        created_at: Timestamp,
        started_at: Option<Timestamp>,
        completed_at: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let mut v = Violations::new();

        if let Some(started) = started_at.filter(|s| *s < created_at) {
            v.violate(
                STARTED_AT,
                Constraint::Ordering,
                format!("start {started} is before creation {created_at}"),
            );
        }
        if let Some(completed) = completed_at {
            let (floor, name) = match started_at {
                Some(started) => (started, "start"),
                None => (created_at, "creation"),
            };
            if completed < floor {
                v.violate(
                    COMPLETED_AT,
                    Constraint::Ordering,
                    format!("completion {completed} is before {name} {floor}"),
                );
            }
        }

        use RunStatus::*;
        let shape_ok = match status {
            Pending => started_at.is_none() && completed_at.is_none(),
            Running => started_at.is_some() && completed_at.is_none(),
            Succeeded | Failed => started_at.is_some() && completed_at.is_some(),
            Cancelled => completed_at.is_some(),
        };
        if !shape_ok {
            v.violate(STATUS, Constraint::Conflict, shape_message(status));
        }

        v.finish_with(|| Self {
            status,
            created_at,
            started_at,
            completed_at,
        })
    }

    /// Fresh `pending` lifecycle
    pub fn pending(created_at: Timestamp) -> Self {
        Self {
            status: RunStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// `pending` to `running`
    pub fn start(&self, at: Timestamp) -> Result<Self, ValidationError> {
        if self.status != RunStatus::Pending {
            return Err(transition_error(self.status, RunStatus::Running));
        }
        Self::new(RunStatus::Running, self.created_at, Some(at), None)
    }

    /// Move to a terminal status. Only `cancelled` may skip `running`.
    pub fn finish(&self, status: RunStatus, at: Timestamp) -> Result<Self, ValidationError> {
        let allowed = match (self.status, status) {
            (RunStatus::Running, s) => s.is_terminal(),
            (RunStatus::Pending, RunStatus::Cancelled) => true,
            _ => false,
        };
        if !allowed {
            return Err(transition_error(self.status, status));
        }
        Self::new(status, self.created_at, self.started_at, Some(at))
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub(crate) fn write(&self, doc: &mut Document) {
        doc.insert(STATUS, self.status.code());
        doc.insert(CREATED_AT, self.created_at.to_storage());
        insert_some(doc, STARTED_AT, self.started_at.map(|t| t.to_storage()));
        insert_some(doc, COMPLETED_AT, self.completed_at.map(|t| t.to_storage()));
    }
}

fn shape_message(status: RunStatus) -> &'static str {
    use RunStatus::*;
    match status {
        Pending => "a pending lifecycle cannot have start or completion timestamps",
        Running => "a running lifecycle needs a start and no completion timestamp",
        Succeeded | Failed => "a finished lifecycle needs start and completion timestamps",
        Cancelled => "a cancelled lifecycle needs a completion timestamp",
    }
}

fn transition_error(from: RunStatus, to: RunStatus) -> ValidationError {
    ValidationError::single(
        STATUS,
        FieldError::new(
            Constraint::Conflict,
            format!("cannot move from {from} to {to}"),
        ),
    )
}
