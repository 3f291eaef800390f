//! Contract Trait
//!
//! The seam between entities and codecs. An entity describes its type tag,
//! schema version and field list, and converts to and from the canonical
//! field document. Codecs and the compatibility layer only ever talk to
//! entities through this trait.

use std::fmt;

use bson::Document;
use kernel::error::decode::DecodeError;
use kernel::error::validation::ValidationError;
use kernel::text::Trust;
use serde::{Deserialize, Serialize};

/// Entity type tag written into every encoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Configuration,
    Identity,
    Workflow,
    Run,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Configuration,
        EntityType::Identity,
        EntityType::Workflow,
        EntityType::Run,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            EntityType::Configuration => "configuration",
            EntityType::Identity => "identity",
            EntityType::Workflow => "workflow",
            EntityType::Run => "run",
        }
    }

    /// タグ文字列から復元する。未知のタグは SchemaMismatch
    pub fn from_code(code: &str, expected: EntityType) -> Result<Self, DecodeError> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| DecodeError::schema_mismatch(expected.code(), code))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What the consumer of an encoded record is about to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteContext {
    /// No identity needed (local display, anonymous endpoints)
    #[default]
    Anonymous,
    /// The write is performed on behalf of an identity
    Authenticated,
}

/// A validated, immutable entity with a versioned document shape.
pub trait Contract: Sized + Clone + PartialEq + fmt::Debug + Send + Sync {
    const ENTITY_TYPE: EntityType;

    /// Version of the shape produced by [`Contract::to_document`]
    const SCHEMA_VERSION: u32;

    /// Top-level keys of the current shape. Anything else is preserved as
    /// an extra field.
    const FIELDS: &'static [&'static str];

    /// Field carrying the canonical identifier, if the entity has one.
    const ID_FIELD: Option<&'static str> = Some("id");

    /// Fields excluded from content fingerprints.
    const VOLATILE_FIELDS: &'static [&'static str] = &["id", "created_at"];

    /// Canonical field document with storage-native primitives. Absent
    /// optionals are omitted.
    fn to_document(&self) -> Document;

    /// Read and validate the current shape. Primitives may be native or in
    /// wire form.
    fn from_document(doc: &Document, trust: Trust) -> Result<Self, ValidationError>;

    /// Extra requirements of a write context.
    fn check_context(&self, _context: WriteContext) -> Result<(), ValidationError> {
        Ok(())
    }
}
