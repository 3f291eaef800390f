//! Validation Errors
//!
//! A [`ValidationError`] carries every violated constraint of a construction
//! attempt, each addressed by a field path (`user.email`,
//! `permissions.owners[1]`). Construction code accumulates them in a
//! [`Violations`] collector and only fails once all per-field checks ran.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of constraints a field or invariant can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Field is absent (or null)
    Required,
    /// Required text is empty after sanitization
    EmptyRequiredField,
    /// Value does not match the expected format
    InvalidFormat,
    /// Numeric value outside the allowed range
    OutOfRange,
    /// Text or binary value exceeds its maximum length
    TooLong,
    /// Value is not a member of a closed enumeration
    UnknownVariant,
    MalformedIdentifier,
    AmbiguousTimestamp,
    /// Value has the wrong representation type (e.g. number for text)
    TypeMismatch,
    /// Key not allowed in a closed shape
    UnknownField,
    /// Trusted text still contains markup
    Markup,
    Duplicate,
    /// Two fields disagree with each other
    Conflict,
    /// Timestamps or states in the wrong order
    Ordering,
}

impl Constraint {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use Constraint::*;
        match self {
            Required => "required",
            EmptyRequiredField => "empty_required_field",
            InvalidFormat => "invalid_format",
            OutOfRange => "out_of_range",
            TooLong => "too_long",
            UnknownVariant => "unknown_variant",
            MalformedIdentifier => "malformed_identifier",
            AmbiguousTimestamp => "ambiguous_timestamp",
            TypeMismatch => "type_mismatch",
            UnknownField => "unknown_field",
            Markup => "markup",
            Duplicate => "duplicate",
            Conflict => "conflict",
            Ordering => "ordering",
        }
    }

    /// `true` for constraints that relate two or more fields.
    #[inline]
    pub const fn is_cross_field(&self) -> bool {
        matches!(self, Constraint::Conflict | Constraint::Ordering)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned by a single value check, before it is placed at a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub constraint: Constraint,
    pub message: String,
}

impl FieldError {
    pub fn new(constraint: Constraint, message: impl Into<String>) -> Self {
        Self {
            constraint,
            message: message.into(),
        }
    }

    pub fn required() -> Self {
        Self::new(Constraint::Required, "field is required")
    }

    pub fn type_mismatch(expected: &str) -> Self {
        Self::new(Constraint::TypeMismatch, format!("expected {expected}"))
    }
}

/// One violated constraint at one field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub constraint: Constraint,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.constraint)
    }
}

/// One or more field/invariant violations, all reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Build from a single violation.
    pub fn single(path: impl Into<String>, error: FieldError) -> Self {
        let mut v = Violations::new();
        v.push(path, error);
        Self {
            violations: v.items,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Violation recorded at exactly `path`, if any.
    pub fn at(&self, path: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.path == path)
    }

    /// `true` if some violation is at `path` or nested below it.
    pub fn touches(&self, path: &str) -> bool {
        self.violations.iter().any(|v| is_within(&v.path, path))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for (i, v) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collector used during construction.
///
/// At most one violation is kept per path: the first one recorded wins, so a
/// missing field is not reported again as empty by a later check.
#[derive(Debug, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, error: FieldError) {
        let path = path.into();
        if self.items.iter().any(|v| v.path == path) {
            return;
        }
        self.items.push(Violation {
            path,
            constraint: error.constraint,
            message: error.message,
        });
    }

    pub fn violate(
        &mut self,
        path: impl Into<String>,
        constraint: Constraint,
        message: impl Into<String>,
    ) {
        self.push(path, FieldError::new(constraint, message));
    }

    /// Record the error of `result` at `path`, passing the value through.
    pub fn capture<T>(&mut self, path: &str, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(path, e);
                None
            }
        }
    }

    /// Pass `value` through, recording [`Constraint::Required`] when absent.
    pub fn require<T>(&mut self, path: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(path, FieldError::required());
        }
        value
    }

    /// Merge a nested error, prefixing each of its paths.
    pub fn absorb(&mut self, prefix: &str, error: ValidationError) {
        for v in error.violations {
            let path = if v.path.is_empty() {
                prefix.to_string()
            } else {
                join_path(prefix, &v.path)
            };
            self.push(
                path,
                FieldError {
                    constraint: v.constraint,
                    message: v.message,
                },
            );
        }
    }

    /// Append violations collected elsewhere with absolute paths.
    pub fn merge(&mut self, other: Violations) {
        for v in other.items {
            self.push(
                v.path,
                FieldError {
                    constraint: v.constraint,
                    message: v.message,
                },
            );
        }
    }

    /// `true` if some violation is at `path` or nested below it.
    pub fn has(&self, path: &str) -> bool {
        self.items.iter().any(|v| is_within(&v.path, path))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.items })
        }
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish_with<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        self.finish().map(|()| value())
    }
}

/// Join a field path and a key or index segment.
///
/// ```rust
/// use kernel::error::validation::join_path;
/// assert_eq!(join_path("", "user"), "user");
/// assert_eq!(join_path("user", "email"), "user.email");
/// assert_eq!(join_path("owners", "[1]"), "owners[1]");
/// ```
pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else if segment.starts_with('[') {
        format!("{prefix}{segment}")
    } else {
        format!("{prefix}.{segment}")
    }
}

fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}
