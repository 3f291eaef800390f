//! Decode Errors
//!
//! Failures that happen before an entity can even be validated: the input is
//! not parseable, describes another entity, or holds a primitive that cannot
//! be converted.

use thiserror::Error;

use super::validation::{Constraint, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Top-level shape is not the requested entity
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("malformed identifier `{input}`: {reason}")]
    MalformedIdentifier { input: String, reason: &'static str },

    /// Timestamp text without an explicit UTC offset
    #[error("ambiguous timestamp `{input}`: an explicit offset is required")]
    AmbiguousTimestamp { input: String },

    #[error("malformed timestamp `{input}`")]
    MalformedTimestamp { input: String },

    #[error("malformed binary blob: {reason}")]
    MalformedBlob { reason: String },

    /// Text or byte input could not be parsed at all
    #[error("{format} syntax error: {message}")]
    Syntax {
        format: &'static str,
        message: String,
    },
}

impl DecodeError {
    pub fn schema_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn syntax(format: &'static str, message: impl ToString) -> Self {
        Self::Syntax {
            format,
            message: message.to_string(),
        }
    }

    /// Field-level form, used when a primitive fails inside an entity field.
    pub fn to_field_error(&self) -> FieldError {
        let constraint = match self {
            DecodeError::MalformedIdentifier { .. } => Constraint::MalformedIdentifier,
            DecodeError::AmbiguousTimestamp { .. } => Constraint::AmbiguousTimestamp,
            DecodeError::MalformedTimestamp { .. } | DecodeError::MalformedBlob { .. } => {
                Constraint::InvalidFormat
            }
            DecodeError::SchemaMismatch { .. } | DecodeError::Syntax { .. } => {
                Constraint::TypeMismatch
            }
        };
        FieldError::new(constraint, self.to_string())
    }
}

impl From<DecodeError> for FieldError {
    fn from(err: DecodeError) -> Self {
        err.to_field_error()
    }
}
