//! Versioned Envelope
//!
//! Every encoded record is laid out as
//! `entity_type`, `schema_version`, entity fields, then extra fields.
//! [`VersionedEnvelope`] is that record before the entity is built;
//! [`Versioned`] is the same record after, with the extras kept aside.

use bson::{Bson, Document};
use kernel::document::{as_i64, as_string};
use kernel::error::contract_error::ContractError;
use kernel::error::decode::DecodeError;
use kernel::error::validation::{Constraint, FieldError, ValidationError};

use crate::domain::contract::{Contract, EntityType};

pub const ENTITY_TYPE: &str = "entity_type";
pub const SCHEMA_VERSION: &str = "schema_version";

/// Raw record of some schema version
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedEnvelope {
    pub entity_type: EntityType,
    pub schema_version: u32,
    /// Fields of the versioned shape
    pub payload: Document,
    /// Top-level fields the current shape does not know, in input order
    pub extras: Document,
}

impl VersionedEnvelope {
    pub fn new(entity_type: EntityType, schema_version: u32, payload: Document) -> Self {
        Self {
            entity_type,
            schema_version,
            payload,
            extras: Document::new(),
        }
    }

    /// Split the layout tags off a decoded record.
    ///
    /// An absent `entity_type` means `expected`; an absent `schema_version`
    /// means `current`. A tag naming another entity is a schema mismatch.
    pub fn from_document(
        mut doc: Document,
        expected: EntityType,
        current: u32,
    ) -> Result<Self, ContractError> {
        let entity_type = match doc.remove(ENTITY_TYPE) {
            None | Some(Bson::Null) => expected,
            Some(value) => {
                let code = as_string(&value).map_err(|_| {
                    DecodeError::schema_mismatch(expected.code(), format!("{value}"))
                })?;
                let found = EntityType::from_code(&code, expected)?;
                if found != expected {
                    return Err(DecodeError::schema_mismatch(expected.code(), code).into());
                }
                found
            }
        };

        let schema_version = match doc.remove(SCHEMA_VERSION) {
            None | Some(Bson::Null) => current,
            Some(value) => {
                let raw = as_i64(&value)
                    .map_err(|e| ValidationError::single(SCHEMA_VERSION, e))?;
                u32::try_from(raw).map_err(|_| {
                    ValidationError::single(
                        SCHEMA_VERSION,
                        FieldError::new(
                            Constraint::OutOfRange,
                            format!("schema version {raw} is not a version number"),
                        ),
                    )
                })?
            }
        };

        Ok(Self::new(entity_type, schema_version, doc))
    }

    /// Move every payload key outside `fields` into the extras.
    pub fn partition(mut self, fields: &[&str]) -> Self {
        let unknown: Vec<String> = self
            .payload
            .keys()
            .filter(|k| !fields.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in unknown {
            if let Some(value) = self.payload.remove(&key) {
                self.extras.insert(key, value);
            }
        }
        self
    }

    /// Record layout: tags, payload, then extras. An extra never overrides a
    /// tag or a payload field.
    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert(ENTITY_TYPE, self.entity_type.code());
        doc.insert(SCHEMA_VERSION, i64::from(self.schema_version));
        for (key, value) in self.payload {
            if key != ENTITY_TYPE && key != SCHEMA_VERSION {
                doc.insert(key, value);
            }
        }
        for (key, value) in self.extras {
            if !doc.contains_key(&key) {
                doc.insert(key, value);
            }
        }
        doc
    }
}

/// A built entity together with the unknown fields it was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<E> {
    pub entity: E,
    pub extras: Document,
}

impl<E: Contract> Versioned<E> {
    pub fn new(entity: E) -> Self {
        Self {
            entity,
            extras: Document::new(),
        }
    }

    pub fn with_extras(entity: E, extras: Document) -> Self {
        Self { entity, extras }
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    /// Envelope at the entity's current version
    pub fn to_envelope(&self) -> VersionedEnvelope {
        VersionedEnvelope {
            entity_type: E::ENTITY_TYPE,
            schema_version: E::SCHEMA_VERSION,
            payload: self.entity.to_document(),
            extras: self.extras.clone(),
        }
    }
}
