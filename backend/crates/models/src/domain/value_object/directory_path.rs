//! Directory Path Value Object
//!
//! A filesystem location reported by the CLI. Paths are data, not rendered
//! text, so they are not sanitized; they only have to be non-empty and free
//! of control characters.

use derive_more::Display;
use kernel::error::validation::{Constraint, FieldError};
use kernel::text::check_length;

pub const DIRECTORY_PATH_MAX_LENGTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct DirectoryPath(String);

impl DirectoryPath {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        let path = raw.trim();
        if path.is_empty() {
            return Err(FieldError::new(
                Constraint::EmptyRequiredField,
                "path cannot be empty",
            ));
        }
        if path.chars().any(char::is_control) {
            return Err(FieldError::new(
                Constraint::InvalidFormat,
                "path contains control characters",
            ));
        }
        check_length(path, DIRECTORY_PATH_MAX_LENGTH)?;
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            DirectoryPath::new(" /data/runs ").unwrap().as_str(),
            "/data/runs"
        );
        assert!(DirectoryPath::new("").is_err());
        assert!(DirectoryPath::new("/data/\u{0007}runs").is_err());
        assert!(DirectoryPath::new("${DATA_ROOT}/runs").is_ok());
    }
}
