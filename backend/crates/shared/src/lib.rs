//! Shared Kernel - vocabulary shared by every contract crate
//!
//! This crate contains the "smallest core" of the data-contract layer:
//! - Error taxonomy (validation, decode, migration) and its classification
//! - Typed canonical identifiers
//! - Primitive adapters between storage-native and wire forms
//! - Field reading over canonical documents, with violation collection
//!
//! **Design Principle**: Only include things that have the same meaning for
//! every entity and every format.

pub mod error {
    pub mod contract_error;
    pub mod conversions;
    pub mod decode;
    pub mod kind;
    pub mod migration;
    pub mod validation;
}
pub mod document;
pub mod id;
pub mod primitives;
pub mod text;
