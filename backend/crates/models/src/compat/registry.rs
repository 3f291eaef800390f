//! Migration Registry
//!
//! Ordered `v → v+1` steps per entity type, assembled once with
//! [`MigrationRegistryBuilder`] and read-only afterwards. Share it by
//! reference; it holds no interior mutability.
//!
//! ## 不変条件
//! - the whole chain `from → current` is resolved before any step runs, so a
//!   gap never leaves a half-upgraded record
//! - upgrading an envelope already at the current version is a no-op

use std::collections::BTreeMap;

use bson::Document;
use kernel::error::migration::{MigrationError, Unmigratable};
use thiserror::Error;

use super::envelope::VersionedEnvelope;
use super::steps;
use crate::domain::contract::{Contract, EntityType};
use crate::domain::entity::{ConfigurationEntity, IdentityEntity, RunEntity, WorkflowEntity};

/// One pure migration step over the payload of version `from`.
pub type MigrationStep = fn(Document) -> Result<Document, Unmigratable>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryBuildError {
    #[error("{entity_type} has two steps from v{from}")]
    DuplicateStep { entity_type: EntityType, from: u32 },

    #[error("{entity_type} step from v{from} does not lead below current v{current}")]
    StepBeyondCurrent {
        entity_type: EntityType,
        from: u32,
        current: u32,
    },

    #[error("{entity_type} has steps but no current version")]
    MissingCurrent { entity_type: EntityType },

    #[error("{entity_type} cannot have current version 0")]
    ZeroVersion { entity_type: EntityType },
}

#[derive(Debug, Clone)]
struct Chain {
    current: u32,
    /// keyed by source version
    steps: BTreeMap<u32, MigrationStep>,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    chains: BTreeMap<EntityType, Chain>,
}

impl MigrationRegistry {
    pub fn builder() -> MigrationRegistryBuilder {
        MigrationRegistryBuilder::default()
    }

    /// Registry with the current versions of all entities and their
    /// standard steps
    pub fn standard() -> Result<Self, RegistryBuildError> {
        Self::builder()
            .register::<ConfigurationEntity>()
            .register::<IdentityEntity>()
            .register::<WorkflowEntity>()
            .register::<RunEntity>()
            .step(EntityType::Configuration, 1, steps::configuration_v1_to_v2)
            .step(EntityType::Identity, 1, steps::identity_v1_to_v2)
            .step(EntityType::Run, 1, steps::run_v1_to_v2)
            .build()
    }

    pub fn current_version(&self, entity_type: EntityType) -> Option<u32> {
        self.chains.get(&entity_type).map(|c| c.current)
    }

    pub fn is_registered(&self, entity_type: EntityType) -> bool {
        self.chains.contains_key(&entity_type)
    }

    /// Bring `envelope` to the current version of its entity type.
    pub fn upgrade(&self, envelope: VersionedEnvelope) -> Result<VersionedEnvelope, MigrationError> {
        let entity_type = envelope.entity_type;
        let chain = self
            .chains
            .get(&entity_type)
            .ok_or_else(|| MigrationError::UnregisteredEntity(entity_type.code().to_string()))?;

        let from = envelope.schema_version;
        if from == chain.current {
            return Ok(envelope);
        }
        let no_path = || MigrationError::NoMigrationPath {
            entity_type: entity_type.code().to_string(),
            from,
            to: chain.current,
        };
        if from == 0 || from > chain.current {
            return Err(no_path());
        }

        let plan: Vec<(u32, MigrationStep)> = (from..chain.current)
            .map(|v| chain.steps.get(&v).map(|step| (v, *step)))
            .collect::<Option<_>>()
            .ok_or_else(no_path)?;

        let VersionedEnvelope {
            payload, extras, ..
        } = envelope;
        let mut payload = payload;
        for (version, step) in plan {
            tracing::debug!(
                entity_type = %entity_type,
                from = version,
                to = version + 1,
                "applying migration step"
            );
            payload = step(payload).map_err(|e| MigrationError::UnmigratableRecord {
                entity_type: entity_type.code().to_string(),
                from_version: version,
                field: e.field,
                reason: e.reason,
            })?;
        }

        Ok(VersionedEnvelope {
            entity_type,
            schema_version: chain.current,
            payload,
            extras,
        })
    }
}

#[derive(Debug, Default)]
pub struct MigrationRegistryBuilder {
    currents: BTreeMap<EntityType, u32>,
    steps: Vec<(EntityType, u32, MigrationStep)>,
}

impl MigrationRegistryBuilder {
    pub fn current(mut self, entity_type: EntityType, version: u32) -> Self {
        self.currents.insert(entity_type, version);
        self
    }

    /// Register `E` at its current schema version
    pub fn register<E: Contract>(self) -> Self {
        self.current(E::ENTITY_TYPE, E::SCHEMA_VERSION)
    }

    /// Step from `from` to `from + 1`
    pub fn step(mut self, entity_type: EntityType, from: u32, step: MigrationStep) -> Self {
        self.steps.push((entity_type, from, step));
        self
    }

    pub fn build(self) -> Result<MigrationRegistry, RegistryBuildError> {
        let mut chains: BTreeMap<EntityType, Chain> = BTreeMap::new();
        for (entity_type, current) in self.currents {
            if current == 0 {
                return Err(RegistryBuildError::ZeroVersion { entity_type });
            }
            chains.insert(
                entity_type,
                Chain {
                    current,
                    steps: BTreeMap::new(),
                },
            );
        }
        for (entity_type, from, step) in self.steps {
            let chain = chains
                .get_mut(&entity_type)
                .ok_or(RegistryBuildError::MissingCurrent { entity_type })?;
            if from == 0 || from >= chain.current {
                return Err(RegistryBuildError::StepBeyondCurrent {
                    entity_type,
                    from,
                    current: chain.current,
                });
            }
            if chain.steps.insert(from, step).is_some() {
                return Err(RegistryBuildError::DuplicateStep { entity_type, from });
            }
        }
        Ok(MigrationRegistry { chains })
    }
}
