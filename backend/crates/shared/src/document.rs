//! Field Reading over canonical documents
//!
//! Entities are read from a `bson::Document`, the canonical field document
//! every format converts to. Wire formats deliver primitives as text
//! (hex identifiers, RFC 3339 timestamps, base64 blobs) while storage
//! delivers native values, so the value readers here accept both forms.
//!
//! [`FieldReader`] walks one mapping, records a violation per failing field
//! (with its full path) and keeps going, so callers see every problem at once.

use bson::{Bson, Document};

use crate::error::validation::{Constraint, FieldError, Violations, join_path};
use crate::id::Id;
use crate::primitives::{BinaryBlob, PrimitiveAdapter, Timestamp};

// ============================================================================
// Value readers
// ============================================================================

fn found(value: &Bson) -> String {
    format!("{:?}", value.element_type())
}

fn mismatch(expected: &str, value: &Bson) -> FieldError {
    FieldError::type_mismatch(&format!("{expected}, found {}", found(value)))
}

pub fn as_string(value: &Bson) -> Result<String, FieldError> {
    match value {
        Bson::String(s) => Ok(s.clone()),
        other => Err(mismatch("string", other)),
    }
}

pub fn as_bool(value: &Bson) -> Result<bool, FieldError> {
    match value {
        Bson::Boolean(b) => Ok(*b),
        other => Err(mismatch("boolean", other)),
    }
}

/// Integers arrive as 32 or 64 bit from storage and as 64 bit or integral
/// doubles from text formats.
pub fn as_i64(value: &Bson) -> Result<i64, FieldError> {
    match value {
        Bson::Int32(n) => Ok(i64::from(*n)),
        Bson::Int64(n) => Ok(*n),
        Bson::Double(d) if d.fract() == 0.0 && d.is_finite() && d.abs() < 9.0e15 => Ok(*d as i64),
        other => Err(mismatch("integer", other)),
    }
}

pub fn as_id<T>(value: &Bson) -> Result<Id<T>, FieldError> {
    match value {
        Bson::ObjectId(oid) => Ok(Id::from_object_id(*oid)),
        Bson::String(s) => Ok(Id::from_wire(s)?),
        other => Err(mismatch("identifier", other)),
    }
}

pub fn as_timestamp(value: &Bson) -> Result<Timestamp, FieldError> {
    match value {
        Bson::DateTime(dt) => Ok(Timestamp::from_storage(*dt)?),
        Bson::String(s) => Ok(Timestamp::from_wire(s)?),
        other => Err(mismatch("timestamp", other)),
    }
}

pub fn as_blob(value: &Bson) -> Result<BinaryBlob, FieldError> {
    match value {
        Bson::Binary(bin) => Ok(BinaryBlob::from_storage(bin.clone())?),
        Bson::String(s) => Ok(BinaryBlob::from_wire(s)?),
        other => Err(mismatch("binary", other)),
    }
}

/// Insert `value` only when present; absent optionals are omitted.
pub fn insert_some<V: Into<Bson>>(doc: &mut Document, key: &str, value: Option<V>) {
    if let Some(value) = value {
        doc.insert(key, value);
    }
}

// ============================================================================
// FieldReader
// ============================================================================

/// Reader over one mapping of a canonical document.
///
/// ## Examples
/// ```rust
/// use bson::doc;
/// use kernel::document::{FieldReader, as_bool, as_string};
///
/// let doc = doc! { "name": "rnaseq", "is_active": 3 };
/// let mut reader = FieldReader::new(&doc);
/// assert_eq!(reader.required("name", as_string).as_deref(), Some("rnaseq"));
/// assert_eq!(reader.optional("is_active", as_bool), None);
/// assert_eq!(reader.required("owner_id", as_string), None);
/// assert_eq!(reader.violations().len(), 2);
/// ```
#[derive(Debug)]
pub struct FieldReader<'a> {
    doc: &'a Document,
    path: String,
    consumed: Vec<&'a str>,
    violations: Violations,
}

impl<'a> FieldReader<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self::at(doc, String::new())
    }

    /// Reader for a nested mapping found at `path`.
    pub fn at(doc: &'a Document, path: impl Into<String>) -> Self {
        Self {
            doc,
            path: path.into(),
            consumed: Vec::new(),
            violations: Violations::new(),
        }
    }

    pub fn path_of(&self, key: &str) -> String {
        join_path(&self.path, key)
    }

    /// Look up `key` and mark it as read. Null counts as absent.
    fn take(&mut self, key: &str) -> Option<&'a Bson> {
        let doc: &'a Document = self.doc;
        let (name, value) = doc.iter().find(|(k, _)| k.as_str() == key)?;
        self.consumed.push(name.as_str());
        match value {
            Bson::Null => None,
            value => Some(value),
        }
    }

    /// Mark `key` as read without interpreting it.
    pub fn skip(&mut self, key: &str) -> Option<&'a Bson> {
        self.take(key)
    }

    pub fn required<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&'a Bson) -> Result<T, FieldError>,
    ) -> Option<T> {
        let path = self.path_of(key);
        match self.take(key) {
            Some(value) => self.violations.capture(&path, parse(value)),
            None => {
                self.violations.push(path, FieldError::required());
                None
            }
        }
    }

    pub fn optional<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&'a Bson) -> Result<T, FieldError>,
    ) -> Option<T> {
        let path = self.path_of(key);
        let value = self.take(key)?;
        self.violations.capture(&path, parse(value))
    }

    /// Read a list. An absent optional list reads as empty; items failing
    /// `parse` are reported at `key[i]` and left out.
    pub fn list<T>(
        &mut self,
        key: &str,
        required: bool,
        mut parse: impl FnMut(&'a Bson) -> Result<T, FieldError>,
    ) -> Vec<T> {
        let path = self.path_of(key);
        let items = match self.take(key) {
            Some(Bson::Array(items)) => items,
            Some(other) => {
                self.violations.push(path, mismatch("list", other));
                return Vec::new();
            }
            None => {
                if required {
                    self.violations.push(path, FieldError::required());
                }
                return Vec::new();
            }
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let item_path = join_path(&path, &format!("[{i}]"));
                self.violations.capture(&item_path, parse(item))
            })
            .collect()
    }

    /// Read a nested closed shape with `build`. Keys `build` does not read
    /// are reported as unknown fields.
    pub fn nested<T>(
        &mut self,
        key: &str,
        required: bool,
        build: impl FnOnce(&mut FieldReader<'a>) -> T,
    ) -> Option<T> {
        let path = self.path_of(key);
        let doc = match self.take(key) {
            Some(Bson::Document(doc)) => doc,
            Some(other) => {
                self.violations.push(path, mismatch("mapping", other));
                return None;
            }
            None => {
                if required {
                    self.violations.push(path, FieldError::required());
                }
                return None;
            }
        };
        let mut inner = FieldReader::at(doc, path);
        let out = build(&mut inner);
        inner.deny_unknown();
        self.violations.merge(inner.violations);
        Some(out)
    }

    /// Iterate the entries of a nested open mapping (name to value).
    pub fn entries<T>(
        &mut self,
        key: &str,
        mut parse: impl FnMut(&'a Bson) -> Result<T, FieldError>,
    ) -> Vec<(String, T)> {
        let path = self.path_of(key);
        let doc = match self.take(key) {
            Some(Bson::Document(doc)) => doc,
            Some(other) => {
                self.violations.push(path, mismatch("mapping", other));
                return Vec::new();
            }
            None => return Vec::new(),
        };
        doc.iter()
            .filter_map(|(name, value)| {
                let entry_path = join_path(&path, name);
                self.violations
                    .capture(&entry_path, parse(value))
                    .map(|v| (name.clone(), v))
            })
            .collect()
    }

    /// Report an error for `key` found by a later check.
    pub fn report(&mut self, key: &str, error: FieldError) {
        let path = self.path_of(key);
        self.violations.push(path, error);
    }

    /// Report every key that was never read as an unknown field.
    pub fn deny_unknown(&mut self) {
        let doc: &'a Document = self.doc;
        let unknown: Vec<String> = doc
            .keys()
            .filter(|k| !self.consumed.contains(&k.as_str()))
            .map(|k| self.path_of(k))
            .collect();
        for path in unknown {
            self.violations.violate(
                path,
                Constraint::UnknownField,
                "unknown field",
            );
        }
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    pub fn into_violations(self) -> Violations {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::validation::Constraint;
    use crate::id::RunId;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn test_identifier_accepts_native_and_wire_forms() {
        let oid = ObjectId::new();
        let native: RunId = as_id(&Bson::ObjectId(oid)).unwrap();
        let wire: RunId = as_id(&Bson::String(oid.to_hex())).unwrap();
        assert_eq!(native, wire);

        let err = as_id::<crate::id::markers::Run>(&Bson::String("abc".into())).unwrap_err();
        assert_eq!(err.constraint, Constraint::MalformedIdentifier);
    }

    #[test]
    fn test_timestamp_accepts_native_and_wire_forms() {
        let ts = Timestamp::from_millis(1_704_103_200_000).unwrap();
        assert_eq!(as_timestamp(&Bson::DateTime(ts.to_storage())).unwrap(), ts);
        assert_eq!(as_timestamp(&Bson::String(ts.to_wire())).unwrap(), ts);

        let err = as_timestamp(&Bson::String("2024-01-01 10:00:00".into())).unwrap_err();
        assert_eq!(err.constraint, Constraint::AmbiguousTimestamp);
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(as_i64(&Bson::Int32(7)).unwrap(), 7);
        assert_eq!(as_i64(&Bson::Int64(7)).unwrap(), 7);
        assert_eq!(as_i64(&Bson::Double(7.0)).unwrap(), 7);
        assert!(as_i64(&Bson::Double(7.5)).is_err());
        assert!(as_i64(&Bson::String("7".into())).is_err());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let doc = doc! { "user": Bson::Null };
        let mut reader = FieldReader::new(&doc);
        assert_eq!(reader.optional("user", as_string), None);
        assert!(reader.violations().is_empty());
        assert_eq!(reader.required("user", as_string), None);
        assert!(reader.violations().has("user"));
    }

    #[test]
    fn test_list_items_reported_by_index() {
        let doc = doc! { "owners": [ObjectId::new(), "nope", ObjectId::new()] };
        let mut reader = FieldReader::new(&doc);
        let ids: Vec<RunId> = reader.list("owners", true, as_id);
        assert_eq!(ids.len(), 2);
        let err = reader.into_violations().finish().unwrap_err();
        assert_eq!(err.violations()[0].path, "owners[1]");
    }

    #[test]
    fn test_nested_shape_is_closed() {
        let doc = doc! { "storage": { "bucket": "runs", "region": "eu" } };
        let mut reader = FieldReader::new(&doc);
        let bucket = reader.nested("storage", true, |r| r.required("bucket", as_string));
        assert_eq!(bucket, Some(Some("runs".to_string())));
        let err = reader.into_violations().finish().unwrap_err();
        assert_eq!(err.violations()[0].path, "storage.region");
        assert_eq!(err.violations()[0].constraint, Constraint::UnknownField);
    }

    #[test]
    fn test_nested_type_mismatch() {
        let doc = doc! { "storage": "minio" };
        let mut reader = FieldReader::new(&doc);
        let out = reader.nested("storage", false, |r| r.required("bucket", as_string));
        assert_eq!(out, None);
        assert!(reader.violations().has("storage"));
    }

    #[test]
    fn test_entries_keep_order_and_report_paths() {
        let doc = doc! { "feature_flags": { "b": true, "a": "yes" } };
        let mut reader = FieldReader::new(&doc);
        let flags = reader.entries("feature_flags", as_bool);
        assert_eq!(flags, vec![("b".to_string(), true)]);
        assert!(reader.violations().has("feature_flags.a"));
    }

    #[test]
    fn test_insert_some_skips_none() {
        let mut doc = Document::new();
        insert_some(&mut doc, "a", Some("x"));
        insert_some::<&str>(&mut doc, "b", None);
        assert_eq!(doc, doc! { "a": "x" });
    }
}
