//! Format Codecs
//!
//! One [`Codec`] drives every format. A [`Format`] only converts between its
//! native representation and the canonical field document; envelope layout,
//! migration and entity construction happen here, once.
//!
//! ## Decode pipeline
//! 1. `Format::read` → canonical document (syntax and top-level shape)
//! 2. envelope tags split off (`entity_type`, `schema_version`)
//! 3. registry upgrade to the current version
//! 4. unknown top-level fields moved to the extras
//! 5. entity built and validated

pub mod fingerprint;
pub mod json;
pub mod storage;
pub mod wire;
pub mod yaml;

pub use fingerprint::fingerprint;
pub use json::JsonFormat;
pub use storage::StorageFormat;
pub use yaml::YamlFormat;

use bson::Document;
use kernel::error::contract_error::ContractError;
use kernel::error::migration::MigrationError;
use kernel::text::Trust;

use crate::compat::{MigrationRegistry, Versioned, VersionedEnvelope};
use crate::domain::contract::{Contract, WriteContext};

/// A concrete representation of canonical documents.
pub trait Format {
    const NAME: &'static str;

    type Input: ?Sized;
    type Output;

    /// Parse `input`. `id_field` names the entity's identifier field, for
    /// formats that keep it under another key.
    fn read(&self, input: &Self::Input, id_field: Option<&str>) -> Result<Document, ContractError>;

    fn write(&self, doc: Document, id_field: Option<&str>) -> Result<Self::Output, ContractError>;

    /// Trust level of free text arriving through this format
    fn trust(&self) -> Trust {
        Trust::Untrusted
    }
}

/// Codec for one format over a shared migration registry.
///
/// ## Examples
/// ```rust
/// use models::codec::{Codec, JsonFormat};
/// use models::compat::MigrationRegistry;
/// use models::domain::entity::ConfigurationEntity;
///
/// let registry = MigrationRegistry::standard().unwrap();
/// let codec = Codec::new(JsonFormat::default(), &registry);
/// let config: ConfigurationEntity = codec
///     .decode(r#"{"api_base_url": "http://localhost:8058"}"#)
///     .unwrap();
/// assert!(config.identity_reference().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Codec<'r, F> {
    format: F,
    registry: &'r MigrationRegistry,
}

impl<'r, F: Format> Codec<'r, F> {
    pub fn new(format: F, registry: &'r MigrationRegistry) -> Self {
        Self { format, registry }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    pub fn encode<E: Contract>(&self, entity: &E) -> Result<F::Output, ContractError> {
        let envelope = VersionedEnvelope::new(E::ENTITY_TYPE, E::SCHEMA_VERSION, entity.to_document());
        self.write(envelope, E::ID_FIELD)
    }

    /// Encode after checking the invariants of the writing context.
    pub fn encode_for<E: Contract>(
        &self,
        entity: &E,
        context: WriteContext,
    ) -> Result<F::Output, ContractError> {
        entity.check_context(context)?;
        self.encode(entity)
    }

    /// Encode together with the unknown fields kept from decoding.
    pub fn encode_envelope<E: Contract>(
        &self,
        versioned: &Versioned<E>,
    ) -> Result<F::Output, ContractError> {
        self.write(versioned.to_envelope(), E::ID_FIELD)
    }

    fn write(
        &self,
        envelope: VersionedEnvelope,
        id_field: Option<&str>,
    ) -> Result<F::Output, ContractError> {
        tracing::debug!(
            format = F::NAME,
            entity_type = %envelope.entity_type,
            schema_version = envelope.schema_version,
            extras = envelope.extras.len(),
            "encoding record"
        );
        self.format.write(envelope.into_document(), id_field)
    }

    /// Decode, dropping unknown fields.
    pub fn decode<E: Contract>(&self, input: &F::Input) -> Result<E, ContractError> {
        let versioned = self.decode_envelope::<E>(input)?;
        if !versioned.extras.is_empty() {
            tracing::debug!(
                format = F::NAME,
                entity_type = %E::ENTITY_TYPE,
                dropped = ?versioned.extras.keys().collect::<Vec<_>>(),
                "unknown fields dropped"
            );
        }
        Ok(versioned.into_entity())
    }

    /// Decode, keeping unknown fields for re-emission.
    pub fn decode_envelope<E: Contract>(
        &self,
        input: &F::Input,
    ) -> Result<Versioned<E>, ContractError> {
        let doc = self.format.read(input, E::ID_FIELD)?;
        let envelope = VersionedEnvelope::from_document(doc, E::ENTITY_TYPE, E::SCHEMA_VERSION)?;
        let stored_version = envelope.schema_version;
        let upgraded = self.registry.upgrade(envelope)?;
        if upgraded.schema_version != E::SCHEMA_VERSION {
            return Err(MigrationError::NoMigrationPath {
                entity_type: E::ENTITY_TYPE.code().to_string(),
                from: upgraded.schema_version,
                to: E::SCHEMA_VERSION,
            }
            .into());
        }
        tracing::debug!(
            format = F::NAME,
            entity_type = %E::ENTITY_TYPE,
            from = stored_version,
            to = E::SCHEMA_VERSION,
            "decoding record"
        );

        let VersionedEnvelope {
            payload, extras, ..
        } = upgraded.partition(E::FIELDS);
        let entity = E::from_document(&payload, self.format.trust())?;
        Ok(Versioned::with_extras(entity, extras))
    }
}
