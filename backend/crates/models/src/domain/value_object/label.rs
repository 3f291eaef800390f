//! Free-text labels
//!
//! Human-entered text that other components render. Untrusted input is
//! sanitized before the length and emptiness rules apply; trusted input must
//! already be clean.

use derive_more::Display;
use kernel::error::validation::FieldError;
use kernel::text::{Trust, admit_required_text, admit_text, check_length};

pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;
pub const WORKFLOW_NAME_MAX_LENGTH: usize = 200;
pub const RUN_TAG_MAX_LENGTH: usize = 200;
pub const VERSION_MAX_LENGTH: usize = 64;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

/// Name shown for an identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(raw: &str, trust: Trust) -> Result<Self, FieldError> {
        admit_required_text(raw, trust, DISPLAY_NAME_MAX_LENGTH).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct WorkflowName(String);

impl WorkflowName {
    pub fn new(raw: &str, trust: Trust) -> Result<Self, FieldError> {
        admit_required_text(raw, trust, WORKFLOW_NAME_MAX_LENGTH).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Label a run was registered under (e.g. the run directory name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct RunTag(String);

impl RunTag {
    pub fn new(raw: &str, trust: Trust) -> Result<Self, FieldError> {
        admit_required_text(raw, trust, RUN_TAG_MAX_LENGTH).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Version string of a workflow or an engine (`7.32.4`, `v2.1-rc1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct VersionLabel(String);

impl VersionLabel {
    pub fn new(raw: &str, trust: Trust) -> Result<Self, FieldError> {
        admit_required_text(raw, trust, VERSION_MAX_LENGTH).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Optional long-form text. Empty after sanitization means absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct Description(String);

impl Description {
    pub fn new(raw: &str, trust: Trust) -> Result<Option<Self>, FieldError> {
        let text = admit_text(raw, trust)?;
        if text.is_empty() {
            return Ok(None);
        }
        check_length(&text, DESCRIPTION_MAX_LENGTH)?;
        Ok(Some(Self(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
