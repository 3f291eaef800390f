//! Contracts Facade
//!
//! Entry point for collaborators: one configuration, one registry, and the
//! three codecs built from them.

use crate::codec::{Codec, JsonFormat, StorageFormat, YamlFormat};
use crate::compat::MigrationRegistry;

use super::config::ContractsConfig;

#[derive(Debug, Clone)]
pub struct Contracts<'r> {
    config: ContractsConfig,
    registry: &'r MigrationRegistry,
}

impl<'r> Contracts<'r> {
    pub fn new(config: ContractsConfig, registry: &'r MigrationRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ContractsConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r MigrationRegistry {
        self.registry
    }

    pub fn json(&self) -> Codec<'r, JsonFormat> {
        let format = JsonFormat {
            pretty: self.config.pretty_json,
        };
        Codec::new(format, self.registry)
    }

    pub fn yaml(&self) -> Codec<'r, YamlFormat> {
        let format = if self.config.yaml_expand_env {
            YamlFormat::with_process_env()
        } else {
            YamlFormat::default()
        };
        Codec::new(format, self.registry)
    }

    pub fn storage(&self) -> Codec<'r, StorageFormat> {
        Codec::new(
            StorageFormat::new(self.config.storage_id_field.clone()),
            self.registry,
        )
    }
}
