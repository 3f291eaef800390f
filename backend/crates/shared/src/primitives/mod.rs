//! Primitive Adapters
//!
//! Bidirectional converters between the document store's native primitives
//! and their text wire forms:
//!
//! | primitive        | storage form        | wire form                          |
//! |------------------|---------------------|------------------------------------|
//! | [`crate::id::Id`] | `ObjectId` (12 bytes) | 24 lowercase hex characters      |
//! | [`Timestamp`]    | `DateTime` (ms, UTC) | RFC 3339, milliseconds, `Z` suffix |
//! | [`BinaryBlob`]   | `Binary` (generic)   | standard base64                    |
//!
//! All conversions are pure.

mod blob;
mod timestamp;

pub use blob::BinaryBlob;
pub use timestamp::{MAX_MILLIS, MIN_MILLIS, Timestamp};

use crate::error::decode::DecodeError;

/// Conversion contract shared by every primitive.
pub trait PrimitiveAdapter: Sized {
    /// Document-store native representation
    type Storage;

    fn to_storage(&self) -> Self::Storage;
    fn from_storage(raw: Self::Storage) -> Result<Self, DecodeError>;
    fn to_wire(&self) -> String;
    fn from_wire(text: &str) -> Result<Self, DecodeError>;
}
