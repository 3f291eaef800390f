//! Storage-Native Format
//!
//! The document store's own representation. Primitives stay native
//! (ObjectId, DateTime, Binary) and the entity identifier lives under the
//! driver's key, emitted first.
//!
//! Text read back from storage was admitted once already, so it is checked
//! at [`Trust::Internal`] instead of being sanitized again.

use bson::Document;
use kernel::error::contract_error::ContractError;
use kernel::error::decode::DecodeError;
use kernel::error::validation::{Constraint, FieldError, ValidationError};
use kernel::text::Trust;

use super::Format;

/// Identifier key of the document store driver
pub const DRIVER_ID_FIELD: &str = "_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFormat {
    id_field: String,
}

impl Default for StorageFormat {
    fn default() -> Self {
        Self::new(DRIVER_ID_FIELD)
    }
}

impl StorageFormat {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Raw BSON bytes of a stored document
    pub fn to_bytes(doc: &Document) -> Result<Vec<u8>, ContractError> {
        let mut bytes = Vec::new();
        doc.to_writer(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Document, ContractError> {
        Ok(Document::from_reader(bytes).map_err(DecodeError::from)?)
    }
}

impl Format for StorageFormat {
    const NAME: &'static str = "storage";

    type Input = Document;
    type Output = Document;

    fn read(&self, input: &Document, id_field: Option<&str>) -> Result<Document, ContractError> {
        let mut doc = input.clone();
        let Some(entity_field) = id_field.filter(|f| *f != self.id_field) else {
            return Ok(doc);
        };
        if let Some(id) = doc.remove(&self.id_field) {
            if doc.contains_key(entity_field) {
                return Err(ValidationError::single(
                    entity_field,
                    FieldError::new(
                        Constraint::Conflict,
                        format!("both `{}` and `{entity_field}` are present", self.id_field),
                    ),
                )
                .into());
            }
            doc.insert(entity_field, id);
        }
        Ok(doc)
    }

    fn write(&self, mut doc: Document, id_field: Option<&str>) -> Result<Document, ContractError> {
        let Some(id) = id_field.and_then(|f| doc.remove(f)) else {
            return Ok(doc);
        };
        let mut out = Document::new();
        out.insert(self.id_field.clone(), id);
        for (key, value) in doc {
            out.insert(key, value);
        }
        Ok(out)
    }

    fn trust(&self) -> Trust {
        Trust::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn test_identifier_moved_first() {
        let oid = ObjectId::new();
        let doc = doc! { "entity_type": "run", "id": oid, "run_tag": "r1" };
        let stored = StorageFormat::default().write(doc, Some("id")).unwrap();
        let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id", "entity_type", "run_tag"]);
        assert_eq!(stored.get_object_id("_id").unwrap(), oid);
    }

    #[test]
    fn test_read_renames_driver_key() {
        let oid = ObjectId::new();
        let doc = StorageFormat::default()
            .read(&doc! { "_id": oid, "run_tag": "r1" }, Some("id"))
            .unwrap();
        assert_eq!(doc.get_object_id("id").unwrap(), oid);
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_read_conflicting_ids() {
        let err = StorageFormat::default()
            .read(&doc! { "_id": ObjectId::new(), "id": ObjectId::new() }, Some("id"))
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().at("id").unwrap().constraint,
            Constraint::Conflict
        );
    }

    #[test]
    fn test_entities_without_identifier_untouched() {
        let oid = ObjectId::new();
        let doc = doc! { "_id": oid, "api_base_url": "http://localhost:8058" };
        assert_eq!(StorageFormat::default().read(&doc, None).unwrap(), doc);
    }

    #[test]
    fn test_custom_driver_key() {
        let format = StorageFormat::new("key");
        let stored = format.write(doc! { "id": 1_i64 }, Some("id")).unwrap();
        assert_eq!(stored, doc! { "key": 1_i64 });
    }

    #[test]
    fn test_bytes() {
        let doc = doc! { "_id": ObjectId::new(), "n": 1_i32 };
        let bytes = StorageFormat::to_bytes(&doc).unwrap();
        assert_eq!(StorageFormat::from_bytes(&bytes).unwrap(), doc);

        let err = StorageFormat::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            ContractError::Decode(DecodeError::Syntax { format: "bson", .. })
        ));
    }
}
