//! Workflow Entity
//!
//! A registered workflow: what engine runs it, where its runs land on disk,
//! who may see or change it.
//!
//! ## 不変条件
//! - `owner_id` is one of `permissions.owners`
//! - `workflow_tag` is derived (`engine/name`, or `nf-core/name` for nf-core
//!   catalog entries); a stored tag must match the derived one
//! - lifecycle timestamps are ordered (see [`Lifecycle`])

use bson::{Bson, Document};
use kernel::document::{FieldReader, as_id, as_string, insert_some};
use kernel::error::validation::{Constraint, FieldError, ValidationError, Violations, join_path};
use kernel::id::{IdentityId, WorkflowId};
use kernel::primitives::PrimitiveAdapter;
use kernel::text::Trust;
use regex::Regex;

use super::{LifecycleFields, ensure_id, missing};
use crate::domain::contract::{Contract, EntityType};
use crate::domain::value_object::lifecycle::{COMPLETED_AT, CREATED_AT, STARTED_AT, STATUS};
use crate::domain::value_object::permission::{EDITORS, OWNERS, VIEWERS, as_viewer};
use crate::domain::value_object::{
    CatalogName, Description, DirectoryPath, EngineName, Lifecycle, Permission, RepositoryUrl,
    RunStatus, VersionLabel, Viewer, WorkflowCatalog, WorkflowEngine, WorkflowName,
};

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const ENGINE: &str = "engine";
pub const VERSION: &str = "version";
pub const CATALOG: &str = "catalog";
pub const DESCRIPTION: &str = "description";
pub const REPOSITORY_URL: &str = "repository_url";
pub const CONFIG: &str = "config";
pub const OWNER_ID: &str = "owner_id";
pub const PERMISSIONS: &str = "permissions";
pub const WORKFLOW_TAG: &str = "workflow_tag";

const PARENT_RUNS_LOCATION: &str = "parent_runs_location";
const RUNS_REGEX: &str = "runs_regex";

// ============================================================================
// Builder input
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct WorkflowFields {
    /// generated when absent
    pub id: Option<WorkflowId>,
    pub name: Option<String>,
    pub engine: Option<EngineFields>,
    pub version: Option<String>,
    pub catalog: Option<CatalogFields>,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub config: Option<RunConfigFields>,
    pub owner_id: Option<IdentityId>,
    /// `owner_id` as sole owner when absent
    pub permissions: Option<PermissionFields>,
    /// checked against the derived tag when present
    pub workflow_tag: Option<String>,
    pub lifecycle: LifecycleFields,
}

#[derive(Debug, Clone, Default)]
pub struct EngineFields {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogFields {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunConfigFields {
    pub parent_runs_location: Vec<String>,
    pub runs_regex: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionFields {
    pub owners: Vec<IdentityId>,
    pub editors: Vec<IdentityId>,
    pub viewers: Vec<Viewer>,
}

// ============================================================================
// Run configuration
// ============================================================================

/// Where the runs of a workflow live and how their directories are named.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunConfig {
    parent_runs_location: Vec<DirectoryPath>,
    runs_regex: String,
}

impl RunConfig {
    pub fn parent_runs_location(&self) -> &[DirectoryPath] {
        &self.parent_runs_location
    }

    pub fn runs_regex(&self) -> &str {
        &self.runs_regex
    }

    /// Compiled run directory pattern
    pub fn runs_pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.runs_regex)
    }

    fn build(fields: RunConfigFields, v: &mut Violations) -> Option<Self> {
        let locations_path = join_path(CONFIG, PARENT_RUNS_LOCATION);
        if fields.parent_runs_location.is_empty() {
            v.violate(
                &locations_path,
                Constraint::EmptyRequiredField,
                "at least one parent runs location is required",
            );
        }
        let mut locations = Vec::with_capacity(fields.parent_runs_location.len());
        for (i, raw) in fields.parent_runs_location.iter().enumerate() {
            let path = join_path(&locations_path, &format!("[{i}]"));
            locations.push(v.capture(&path, DirectoryPath::new(raw)));
        }
        let locations: Option<Vec<DirectoryPath>> = locations.into_iter().collect();

        let regex_path = join_path(CONFIG, RUNS_REGEX);
        let runs_regex = v.require(&regex_path, fields.runs_regex).and_then(|raw| {
            let checked = Regex::new(&raw).map(|_| raw).map_err(|e| {
                FieldError::new(Constraint::InvalidFormat, format!("invalid regex pattern: {e}"))
            });
            v.capture(&regex_path, checked)
        });

        Some(Self {
            parent_runs_location: locations.filter(|l| !l.is_empty())?,
            runs_regex: runs_regex?,
        })
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            PARENT_RUNS_LOCATION,
            self.parent_runs_location
                .iter()
                .map(|p| Bson::String(p.to_string()))
                .collect::<Vec<_>>(),
        );
        doc.insert(RUNS_REGEX, self.runs_regex.as_str());
        doc
    }
}

// ============================================================================
// Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowEntity {
    id: WorkflowId,
    name: WorkflowName,
    engine: WorkflowEngine,
    version: Option<VersionLabel>,
    catalog: Option<WorkflowCatalog>,
    description: Option<Description>,
    repository_url: Option<RepositoryUrl>,
    config: RunConfig,
    owner_id: IdentityId,
    permissions: Permission,
    lifecycle: Lifecycle,
}

/// Tag other components use to look a workflow up
pub fn derive_tag(
    engine: &WorkflowEngine,
    name: &WorkflowName,
    catalog: Option<&WorkflowCatalog>,
) -> String {
    match catalog {
        Some(c) if c.name == CatalogName::NfCore => format!("{}/{name}", c.name),
        _ => format!("{}/{name}", engine.name),
    }
}

impl WorkflowEntity {
    pub fn validate_and_construct(fields: WorkflowFields) -> Result<Self, ValidationError> {
        Self::build(fields, Trust::Untrusted, Violations::new())
    }

    fn build(fields: WorkflowFields, trust: Trust, mut v: Violations) -> Result<Self, ValidationError> {
        // per-field
        let name = v
            .require(NAME, fields.name)
            .and_then(|raw| v.capture(NAME, WorkflowName::new(&raw, trust)));
        let engine = v
            .require(ENGINE, fields.engine)
            .and_then(|engine| build_engine(engine, trust, &mut v));
        let version = match fields.version {
            Some(raw) => v.capture(VERSION, VersionLabel::new(&raw, trust)).map(Some),
            None => Some(None),
        };
        let catalog = match fields.catalog {
            Some(catalog) => build_catalog(catalog, &mut v).map(Some),
            None => Some(None),
        };
        let description = match fields.description {
            Some(raw) => v.capture(DESCRIPTION, Description::new(&raw, trust)),
            None => Some(None),
        };
        let repository_url = match fields.repository_url {
            Some(raw) => v.capture(REPOSITORY_URL, RepositoryUrl::new(&raw)).map(Some),
            None => Some(None),
        };
        let config = v
            .require(CONFIG, fields.config)
            .and_then(|config| RunConfig::build(config, &mut v));
        let owner_id = v.require(OWNER_ID, fields.owner_id);
        let permissions = match fields.permissions {
            Some(p) => match Permission::new(p.owners, p.editors, p.viewers) {
                Ok(permissions) => Some(permissions),
                Err(e) => {
                    v.absorb(PERMISSIONS, e);
                    None
                }
            },
            None => owner_id.map(Permission::owned_by),
        };
        let status = fields.lifecycle.status(&mut v);
        v.finish()?;

        let (
            Some(name),
            Some(engine),
            Some(version),
            Some(catalog),
            Some(description),
            Some(repository_url),
            Some(config),
            Some(owner_id),
            Some(permissions),
            Some(status),
        ) = (
            name,
            engine,
            version,
            catalog,
            description,
            repository_url,
            config,
            owner_id,
            permissions,
            status,
        )
        else {
            return Err(missing(""));
        };

        // cross-field
        let mut v = Violations::new();
        if !permissions.is_owner(owner_id) {
            v.violate(
                join_path(PERMISSIONS, OWNERS),
                Constraint::Conflict,
                format!("owner {owner_id} is not listed among the owners"),
            );
        }
        let tag = derive_tag(&engine, &name, catalog.as_ref());
        if let Some(given) = fields.workflow_tag.filter(|given| *given != tag) {
            v.violate(
                WORKFLOW_TAG,
                Constraint::Conflict,
                format!("tag `{given}` does not match the derived tag `{tag}`"),
            );
        }
        let lifecycle = fields.lifecycle.build(status, &mut v);
        v.finish()?;
        let lifecycle = lifecycle.ok_or_else(|| missing(STATUS))?;

        Ok(Self {
            id: ensure_id(fields.id),
            name,
            engine,
            version,
            catalog,
            description,
            repository_url,
            config,
            owner_id,
            permissions,
            lifecycle,
        })
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn name(&self) -> &WorkflowName {
        &self.name
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn version(&self) -> Option<&VersionLabel> {
        self.version.as_ref()
    }

    pub fn catalog(&self) -> Option<&WorkflowCatalog> {
        self.catalog.as_ref()
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn repository_url(&self) -> Option<&RepositoryUrl> {
        self.repository_url.as_ref()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn owner_id(&self) -> IdentityId {
        self.owner_id
    }

    pub fn permissions(&self) -> &Permission {
        &self.permissions
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn status(&self) -> RunStatus {
        self.lifecycle.status()
    }

    pub fn workflow_tag(&self) -> String {
        derive_tag(&self.engine, &self.name, self.catalog.as_ref())
    }
}

fn build_engine(fields: EngineFields, trust: Trust, v: &mut Violations) -> Option<WorkflowEngine> {
    let name_path = join_path(ENGINE, "name");
    let name = v
        .require(&name_path, fields.name)
        .and_then(|raw| v.capture(&name_path, EngineName::from_code(&raw)));
    let version = match fields.version {
        Some(raw) => Some(v.capture(&join_path(ENGINE, "version"), VersionLabel::new(&raw, trust))?),
        None => None,
    };
    Some(WorkflowEngine {
        name: name?,
        version,
    })
}

fn build_catalog(fields: CatalogFields, v: &mut Violations) -> Option<WorkflowCatalog> {
    let name_path = join_path(CATALOG, "name");
    let url_path = join_path(CATALOG, "url");
    let name = v
        .require(&name_path, fields.name)
        .and_then(|raw| v.capture(&name_path, CatalogName::from_code(&raw)));
    let url = v
        .require(&url_path, fields.url)
        .and_then(|raw| v.capture(&url_path, RepositoryUrl::new(&raw)));
    Some(WorkflowCatalog {
        name: name?,
        url: url?,
    })
}

fn read_fields(reader: &mut FieldReader<'_>) -> WorkflowFields {
    WorkflowFields {
        id: reader.optional(ID, as_id),
        name: reader.required(NAME, as_string),
        engine: reader.nested(ENGINE, true, |r| EngineFields {
            name: r.required("name", as_string),
            version: r.optional("version", as_string),
        }),
        version: reader.optional(VERSION, as_string),
        catalog: reader.nested(CATALOG, false, |r| CatalogFields {
            name: r.required("name", as_string),
            url: r.required("url", as_string),
        }),
        description: reader.optional(DESCRIPTION, as_string),
        repository_url: reader.optional(REPOSITORY_URL, as_string),
        config: reader.nested(CONFIG, true, |r| RunConfigFields {
            parent_runs_location: r.list(PARENT_RUNS_LOCATION, true, as_string),
            runs_regex: r.required(RUNS_REGEX, as_string),
        }),
        owner_id: reader.required(OWNER_ID, as_id),
        permissions: reader.nested(PERMISSIONS, false, |r| PermissionFields {
            owners: r.list(OWNERS, true, as_id),
            editors: r.list(EDITORS, false, as_id),
            viewers: r.list(VIEWERS, false, as_viewer),
        }),
        workflow_tag: reader.optional(WORKFLOW_TAG, as_string),
        lifecycle: LifecycleFields::read(reader),
    }
}

impl Contract for WorkflowEntity {
    const ENTITY_TYPE: EntityType = EntityType::Workflow;
    const SCHEMA_VERSION: u32 = 1;
    const FIELDS: &'static [&'static str] = &[
        ID,
        NAME,
        ENGINE,
        VERSION,
        CATALOG,
        DESCRIPTION,
        REPOSITORY_URL,
        CONFIG,
        OWNER_ID,
        PERMISSIONS,
        WORKFLOW_TAG,
        STATUS,
        CREATED_AT,
        STARTED_AT,
        COMPLETED_AT,
    ];

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID, self.id.to_storage());
        doc.insert(NAME, self.name.as_str());

        let mut engine = Document::new();
        engine.insert("name", self.engine.name.code());
        insert_some(&mut engine, "version", self.engine.version.as_ref().map(|v| v.as_str()));
        doc.insert(ENGINE, engine);

        insert_some(&mut doc, VERSION, self.version.as_ref().map(|v| v.as_str()));
        if let Some(catalog) = &self.catalog {
            let mut c = Document::new();
            c.insert("name", catalog.name.code());
            c.insert("url", catalog.url.as_str());
            doc.insert(CATALOG, c);
        }
        insert_some(&mut doc, DESCRIPTION, self.description.as_ref().map(|d| d.as_str()));
        insert_some(
            &mut doc,
            REPOSITORY_URL,
            self.repository_url.as_ref().map(|u| u.as_str()),
        );
        doc.insert(CONFIG, self.config.to_document());
        doc.insert(OWNER_ID, self.owner_id.to_storage());
        doc.insert(PERMISSIONS, self.permissions.to_document());
        doc.insert(WORKFLOW_TAG, self.workflow_tag());
        self.lifecycle.write(&mut doc);
        doc
    }

    fn from_document(doc: &Document, trust: Trust) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(doc);
        let fields = read_fields(&mut reader);
        reader.deny_unknown();
        Self::build(fields, trust, reader.into_violations())
    }
}
