//! Content Fingerprint
//!
//! SHA-256 over the canonical wire JSON of an entity: envelope tags
//! included, volatile fields (identifier, creation time) removed, keys
//! sorted at every level. Two records with the same content hash to the
//! same value no matter when or where they were created.

use kernel::error::contract_error::ContractError;
use serde_json::{Map, Value};

use super::wire;
use crate::compat::VersionedEnvelope;
use crate::domain::contract::Contract;
use crate::domain::value_object::ContentHash;

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sorted(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

pub fn fingerprint<E: Contract>(entity: &E) -> Result<ContentHash, ContractError> {
    let mut doc =
        VersionedEnvelope::new(E::ENTITY_TYPE, E::SCHEMA_VERSION, entity.to_document()).into_document();
    for field in E::VOLATILE_FIELDS {
        doc.remove(*field);
    }
    let canonical = sorted(wire::to_json(&doc)?);
    let bytes = serde_json::to_vec(&canonical).map_err(ContractError::serialization)?;
    Ok(ContentHash::of(&bytes))
}
