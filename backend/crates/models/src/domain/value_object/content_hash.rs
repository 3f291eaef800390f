use derive_more::Display;
use kernel::error::validation::{Constraint, FieldError};

/// SHA-256 digest as 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct ContentHash(String);

impl ContentHash {
    /// Digest of `bytes`
    pub fn of(bytes: &[u8]) -> Self {
        Self(platform::crypto::sha256_hex(bytes))
    }

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let valid = raw.len() == 64 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            return Err(FieldError::new(
                Constraint::InvalidFormat,
                "expected 64 lowercase hex characters",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
