//! Run Entity
//!
//! One execution of a workflow. Refers to its workflow and owner by id.

use bson::Document;
use kernel::document::{FieldReader, as_id, as_string};
use kernel::error::validation::{ValidationError, Violations};
use kernel::id::{IdentityId, RunId, WorkflowId};
use kernel::primitives::{PrimitiveAdapter, Timestamp};
use kernel::text::Trust;

use super::{LifecycleFields, ensure_id, missing};
use crate::domain::contract::{Contract, EntityType};
use crate::domain::value_object::lifecycle::{COMPLETED_AT, CREATED_AT, STARTED_AT, STATUS};
use crate::domain::value_object::{DirectoryPath, Lifecycle, RunStatus, RunTag};

pub const ID: &str = "id";
pub const WORKFLOW_ID: &str = "workflow_id";
pub const OWNER_ID: &str = "owner_id";
pub const RUN_TAG: &str = "run_tag";
pub const RUN_LOCATION: &str = "run_location";

#[derive(Debug, Clone, Default)]
pub struct RunFields {
    /// generated when absent
    pub id: Option<RunId>,
    pub workflow_id: Option<WorkflowId>,
    pub owner_id: Option<IdentityId>,
    pub run_tag: Option<String>,
    pub run_location: Option<String>,
    pub lifecycle: LifecycleFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunEntity {
    id: RunId,
    workflow_id: WorkflowId,
    owner_id: IdentityId,
    run_tag: RunTag,
    run_location: DirectoryPath,
    lifecycle: Lifecycle,
}

impl RunEntity {
    pub fn validate_and_construct(fields: RunFields) -> Result<Self, ValidationError> {
        Self::build(fields, Trust::Untrusted, Violations::new())
    }

    fn build(fields: RunFields, trust: Trust, mut v: Violations) -> Result<Self, ValidationError> {
        let workflow_id = v.require(WORKFLOW_ID, fields.workflow_id);
        let owner_id = v.require(OWNER_ID, fields.owner_id);
        let run_tag = v
            .require(RUN_TAG, fields.run_tag)
            .and_then(|raw| v.capture(RUN_TAG, RunTag::new(&raw, trust)));
        let run_location = v
            .require(RUN_LOCATION, fields.run_location)
            .and_then(|raw| v.capture(RUN_LOCATION, DirectoryPath::new(&raw)));
        let status = fields.lifecycle.status(&mut v);
        v.finish()?;

        let (Some(workflow_id), Some(owner_id), Some(run_tag), Some(run_location), Some(status)) =
            (workflow_id, owner_id, run_tag, run_location, status)
        else {
            return Err(missing(RUN_TAG));
        };

        let mut v = Violations::new();
        let lifecycle = fields.lifecycle.build(status, &mut v);
        v.finish()?;

        Ok(Self {
            id: ensure_id(fields.id),
            workflow_id,
            owner_id,
            run_tag,
            run_location,
            lifecycle: lifecycle.ok_or_else(|| missing(STATUS))?,
        })
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn owner_id(&self) -> IdentityId {
        self.owner_id
    }

    pub fn run_tag(&self) -> &RunTag {
        &self.run_tag
    }

    pub fn run_location(&self) -> &DirectoryPath {
        &self.run_location
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn status(&self) -> RunStatus {
        self.lifecycle.status()
    }

    /// Builder input holding this run's values
    pub fn to_fields(&self) -> RunFields {
        RunFields {
            id: Some(self.id),
            workflow_id: Some(self.workflow_id),
            owner_id: Some(self.owner_id),
            run_tag: Some(self.run_tag.to_string()),
            run_location: Some(self.run_location.to_string()),
            lifecycle: LifecycleFields::from_lifecycle(&self.lifecycle),
        }
    }

    /// `pending` to `running`
    pub fn start(&self, at: Timestamp) -> Result<Self, ValidationError> {
        Ok(Self {
            lifecycle: self.lifecycle.start(at)?,
            ..self.clone()
        })
    }

    /// Move to a terminal status
    pub fn finish(&self, status: RunStatus, at: Timestamp) -> Result<Self, ValidationError> {
        Ok(Self {
            lifecycle: self.lifecycle.finish(status, at)?,
            ..self.clone()
        })
    }
}

impl Contract for RunEntity {
    const ENTITY_TYPE: EntityType = EntityType::Run;
    const SCHEMA_VERSION: u32 = 2;
    const FIELDS: &'static [&'static str] = &[
        ID,
        WORKFLOW_ID,
        OWNER_ID,
        RUN_TAG,
        RUN_LOCATION,
        STATUS,
        CREATED_AT,
        STARTED_AT,
        COMPLETED_AT,
    ];

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID, self.id.to_storage());
        doc.insert(WORKFLOW_ID, self.workflow_id.to_storage());
        doc.insert(OWNER_ID, self.owner_id.to_storage());
        doc.insert(RUN_TAG, self.run_tag.as_str());
        doc.insert(RUN_LOCATION, self.run_location.as_str());
        self.lifecycle.write(&mut doc);
        doc
    }

    fn from_document(doc: &Document, trust: Trust) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(doc);
        let fields = RunFields {
            id: reader.optional(ID, as_id),
            workflow_id: reader.required(WORKFLOW_ID, as_id),
            owner_id: reader.required(OWNER_ID, as_id),
            run_tag: reader.required(RUN_TAG, as_string),
            run_location: reader.required(RUN_LOCATION, as_string),
            lifecycle: LifecycleFields::read(&mut reader),
        };
        reader.deny_unknown();
        Self::build(fields, trust, reader.into_violations())
    }
}
