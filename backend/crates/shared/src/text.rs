//! Free-text admission
//!
//! Untrusted text (wire input, builder input) is sanitized; trusted text
//! (read back from storage) is not rewritten but must already be clean.

use platform::sanitize::{is_clean, sanitize_text};

use crate::error::validation::{Constraint, FieldError};

/// Where the field values being validated come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trust {
    /// Caller input, wire formats: free text is sanitized
    #[default]
    Untrusted,
    /// Already-validated state (storage): no re-sanitization, invariants
    /// still checked
    Internal,
}

/// Admit a free-text value.
///
/// Returns the text to store. An empty result is left for the caller to
/// judge, since only some fields require content.
pub fn admit_text(raw: &str, trust: Trust) -> Result<String, FieldError> {
    match trust {
        Trust::Untrusted => Ok(sanitize_text(raw)),
        Trust::Internal if is_clean(raw) => Ok(raw.to_string()),
        Trust::Internal => Err(FieldError::new(
            Constraint::Markup,
            "stored text contains markup or unsanitized content",
        )),
    }
}

/// Admit a text value that must stay non-empty and at most `max` characters.
pub fn admit_required_text(raw: &str, trust: Trust, max: usize) -> Result<String, FieldError> {
    let text = admit_text(raw, trust)?;
    if text.is_empty() {
        return Err(FieldError::new(
            Constraint::EmptyRequiredField,
            "must not be empty after sanitization",
        ));
    }
    check_length(&text, max)?;
    Ok(text)
}

/// Fail with [`Constraint::TooLong`] past `max` characters.
pub fn check_length(text: &str, max: usize) -> Result<(), FieldError> {
    let length = text.chars().count();
    if length > max {
        return Err(FieldError::new(
            Constraint::TooLong,
            format!("is too long ({length} chars, maximum {max})"),
        ));
    }
    Ok(())
}
