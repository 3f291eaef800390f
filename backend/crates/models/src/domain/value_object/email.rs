//! Email Value Object
//!
//! Syntactic check only. The domain part is case-insensitive and stored
//! lowercased; the local part is kept as written.

use std::sync::LazyLock;

use derive_more::Display;
use kernel::error::validation::{Constraint, FieldError};
use regex::Regex;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// dot-atom local part
static LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("local part pattern is valid")
});

/// one DNS label
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{address}")]
pub struct Email {
    address: String,
    /// byte offset of `@`
    at: usize,
}

fn invalid(reason: &str) -> FieldError {
    FieldError::new(Constraint::InvalidFormat, format!("invalid email: {reason}"))
}

impl Email {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FieldError::new(
                Constraint::EmptyRequiredField,
                "email cannot be empty",
            ));
        }
        if raw.chars().count() > EMAIL_MAX_LENGTH {
            return Err(FieldError::new(
                Constraint::TooLong,
                format!("email must be at most {EMAIL_MAX_LENGTH} characters"),
            ));
        }

        let (local, domain) = raw
            .rsplit_once('@')
            .ok_or_else(|| invalid("missing `@`"))?;
        if local.len() > LOCAL_PART_MAX_LENGTH || !LOCAL_PART.is_match(local) {
            return Err(invalid("malformed local part"));
        }

        let domain = domain.to_ascii_lowercase();
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || !labels.iter().all(|l| LABEL.is_match(l)) {
            return Err(invalid("malformed domain"));
        }
        let tld_ok = labels
            .last()
            .is_some_and(|tld| tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()));
        if !tld_ok {
            return Err(invalid("top-level domain must be alphabetic"));
        }

        Ok(Self {
            address: format!("{local}@{domain}"),
            at: local.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn local_part(&self) -> &str {
        &self.address[..self.at]
    }

    pub fn domain(&self) -> &str {
        &self.address[self.at + 1..]
    }
}
