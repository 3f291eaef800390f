//! Application Configuration
//!
//! Configuration for the codecs handed out by [`super::Contracts`].

use serde::Deserialize;

use crate::codec::storage::DRIVER_ID_FIELD;

/// Contract layer configuration
///
/// Collaborators may embed it in their own settings; missing keys take the
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Identifier key of the document store driver
    pub storage_id_field: String,
    /// Indent JSON output
    pub pretty_json: bool,
    /// Expand `$NAME` / `${NAME}` in YAML strings from the process environment
    pub yaml_expand_env: bool,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            storage_id_field: DRIVER_ID_FIELD.to_string(),
            pretty_json: false,
            yaml_expand_env: false,
        }
    }
}

impl ContractsConfig {
    /// Config files written and read by the CLI collaborator
    pub fn cli() -> Self {
        Self {
            pretty_json: true,
            yaml_expand_env: true,
            ..Default::default()
        }
    }

    /// Compact output, no environment access
    pub fn server() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ContractsConfig::default().storage_id_field, "_id");
        assert!(ContractsConfig::cli().yaml_expand_env);
        assert!(!ContractsConfig::server().pretty_json);
    }

    #[test]
    fn test_partial_settings_take_defaults() {
        let config: ContractsConfig = serde_json::from_str(r#"{"pretty_json": true}"#).unwrap();
        assert!(config.pretty_json);
        assert_eq!(config.storage_id_field, "_id");
    }
}
