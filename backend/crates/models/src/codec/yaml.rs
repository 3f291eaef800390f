//! YAML Format
//!
//! Configuration files. Parsed through the same JSON value model as the
//! wire format, so scalars keep one meaning across both text formats.
//! With expansion enabled, `$NAME` and `${NAME}` in string scalars are
//! replaced from the environment lookup before the entity is built, and
//! `$$` reads as a literal `$`. Such a format writes every `$` in string
//! scalars as `$$`, so its own output reads back unchanged.

use std::fmt;

use bson::Document;
use kernel::error::contract_error::ContractError;
use kernel::error::decode::DecodeError;
use serde_json::Value;

use super::Format;
use super::wire;

/// Environment lookup used for expansion
pub type EnvLookup = fn(&str) -> Option<String>;

#[derive(Clone, Copy, Default)]
pub struct YamlFormat {
    env: Option<EnvLookup>,
}

impl YamlFormat {
    /// Expand placeholders from the process environment
    pub fn with_process_env() -> Self {
        Self::with_env(platform::env::process_env)
    }

    pub fn with_env(lookup: EnvLookup) -> Self {
        Self { env: Some(lookup) }
    }

    pub fn expands_env(&self) -> bool {
        self.env.is_some()
    }
}

impl fmt::Debug for YamlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YamlFormat")
            .field("expand_env", &self.expands_env())
            .finish()
    }
}

fn expand(value: &mut Value, lookup: EnvLookup) {
    match value {
        Value::String(text) => {
            let expanded = platform::env::expand_vars(text.as_str(), lookup);
            if expanded != text.as_str() {
                tracing::trace!(original = %text, "expanded environment placeholders");
                *text = expanded.into_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| expand(item, lookup)),
        Value::Object(map) => map.values_mut().for_each(|item| expand(item, lookup)),
        _ => {}
    }
}

fn escape(value: &mut Value) {
    match value {
        Value::String(text) if text.contains('$') => {
            *text = platform::env::escape_vars(text.as_str()).into_owned();
        }
        Value::Array(items) => items.iter_mut().for_each(escape),
        Value::Object(map) => map.values_mut().for_each(escape),
        _ => {}
    }
}

impl Format for YamlFormat {
    const NAME: &'static str = "yaml";

    type Input = str;
    type Output = String;

    fn read(&self, input: &str, _id_field: Option<&str>) -> Result<Document, ContractError> {
        let mut value: Value = serde_yaml::from_str(input).map_err(DecodeError::from)?;
        if let Some(lookup) = self.env {
            expand(&mut value, lookup);
        }
        Ok(wire::from_json(value)?)
    }

    fn write(&self, doc: Document, _id_field: Option<&str>) -> Result<String, ContractError> {
        let mut value = wire::to_json(&doc)?;
        if self.expands_env() {
            escape(&mut value);
        }
        serde_yaml::to_string(&value).map_err(ContractError::serialization)
    }
}
