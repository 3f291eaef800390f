//! Common ID Types
//!
//! Type-safe wrappers over the document store's 12-byte object identifier.
//! The wire form is always 24 lowercase hexadecimal characters.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use bson::oid::ObjectId;

use crate::error::decode::DecodeError;
use crate::primitives::PrimitiveAdapter;

/// Length of the wire form in characters
pub const ID_HEX_LENGTH: usize = 24;

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type RunId = Id<markers::Run>;
/// let id = RunId::new();
/// assert_eq!(id.to_string().len(), 24);
/// ```
pub struct Id<T> {
    value: ObjectId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Generate a fresh identifier, compatible with store-side generation
    pub fn new() -> Self {
        Self::from_object_id(ObjectId::new())
    }

    pub const fn from_object_id(value: ObjectId) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self::from_object_id(ObjectId::from_bytes(bytes))
    }

    pub fn as_object_id(&self) -> &ObjectId {
        &self.value
    }

    pub fn into_object_id(self) -> ObjectId {
        self.value
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.value.bytes()
    }

    /// Parse the wire form.
    ///
    /// Only lowercase hex is accepted, so every accepted string is exactly
    /// what [`Id::to_hex`] produces for the parsed value.
    pub fn parse_hex(input: &str) -> Result<Self, DecodeError> {
        let malformed = |reason| DecodeError::MalformedIdentifier {
            input: input.to_string(),
            reason,
        };
        if input.len() != ID_HEX_LENGTH {
            return Err(malformed("expected exactly 24 hex characters"));
        }
        if !input.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(malformed("expected lowercase hexadecimal characters"));
        }
        ObjectId::parse_str(input)
            .map(Self::from_object_id)
            .map_err(|_| malformed("not a valid object identifier"))
    }

    pub fn to_hex(&self) -> String {
        self.value.to_hex()
    }
}

impl<T> PrimitiveAdapter for Id<T> {
    type Storage = ObjectId;

    fn to_storage(&self) -> ObjectId {
        self.value
    }

    fn from_storage(raw: ObjectId) -> Result<Self, DecodeError> {
        Ok(Self::from_object_id(raw))
    }

    fn to_wire(&self) -> String {
        self.to_hex()
    }

    fn from_wire(text: &str) -> Result<Self, DecodeError> {
        Self::parse_hex(text)
    }
}

// Manual impls: derives would demand the same traits from the marker type.

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.bytes().hash(state);
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.bytes().cmp(&other.value.bytes())
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value.to_hex())
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value.to_hex())
    }
}

impl<T> From<ObjectId> for Id<T> {
    fn from(value: ObjectId) -> Self {
        Self::from_object_id(value)
    }
}

impl<T> From<Id<T>> for ObjectId {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

/// Marker types for different entity IDs
pub mod markers {
    /// Marker for Identity (user/principal) IDs
    pub struct Identity;

    /// Marker for Group IDs
    pub struct Group;

    /// Marker for Workflow IDs
    pub struct Workflow;

    /// Marker for Run IDs
    pub struct Run;
}

/// Type aliases for common IDs
pub type IdentityId = Id<markers::Identity>;
pub type GroupId = Id<markers::Group>;
pub type WorkflowId = Id<markers::Workflow>;
pub type RunId = Id<markers::Run>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_id_type_safety() {
        let run_id: RunId = Id::new();
        let workflow_id: WorkflowId = Id::new();

        // These are different types, cannot be mixed
        let _r: ObjectId = run_id.into_object_id();
        let _w: ObjectId = workflow_id.into_object_id();
    }

    #[test]
    fn test_wire_form_accepts_24_lowercase_hex() {
        let s = "64b7f0c2a1e4d3c2b1a09f8e";
        let id = RunId::from_wire(s).unwrap();
        assert_eq!(id.to_wire(), s);
    }

    #[test]
    fn test_wire_form_rejects_23_chars() {
        let err = RunId::from_wire("64b7f0c2a1e4d3c2b1a09f8").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_wire_form_rejects_non_hex_and_uppercase() {
        assert!(RunId::from_wire("64b7f0c2a1e4d3c2b1a09fzz").is_err());
        assert!(RunId::from_wire("64B7F0C2A1E4D3C2B1A09F8E").is_err());
        assert!(RunId::from_wire("").is_err());
    }

    #[test]
    fn test_storage_form_is_the_object_id() {
        let oid = ObjectId::new();
        let id = IdentityId::from_storage(oid).unwrap();
        assert_eq!(id.to_storage(), oid);
        assert_eq!(id.bytes(), oid.bytes());
    }

    proptest! {
        #[test]
        fn prop_identifier_symmetry(bytes in any::<[u8; 12]>()) {
            let id = RunId::from_bytes(bytes);
            prop_assert_eq!(RunId::from_wire(&id.to_wire()).unwrap(), id);
            prop_assert_eq!(RunId::from_storage(id.to_storage()).unwrap(), id);
        }

        #[test]
        fn prop_accepted_wire_strings_round_trip(s in "[0-9a-f]{24}") {
            let id = RunId::from_wire(&s).unwrap();
            prop_assert_eq!(id.to_wire(), s);
        }
    }
}
