//! Access Token Value Object
//!
//! The API token a CLI configuration carries for its identity. Expiry is
//! recorded, not enforced: the core has no clock, the server decides.

use std::fmt;

use kernel::error::validation::{Constraint, FieldError};
use kernel::primitives::Timestamp;

use super::label::DisplayName;

pub const ACCESS_TOKEN_MAX_LENGTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenType {
    #[default]
    Bearer,
}

impl TokenType {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            TokenType::Bearer => "bearer",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        if code.eq_ignore_ascii_case("bearer") {
            Ok(TokenType::Bearer)
        } else {
            Err(FieldError::new(
                Constraint::UnknownVariant,
                format!("unsupported token type `{code}`, expected bearer"),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenLifetime {
    #[default]
    ShortLived,
    LongLived,
}

impl TokenLifetime {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            TokenLifetime::ShortLived => "short-lived",
            TokenLifetime::LongLived => "long-lived",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        match code {
            "short-lived" => Ok(TokenLifetime::ShortLived),
            "long-lived" => Ok(TokenLifetime::LongLived),
            _ => Err(FieldError::new(
                Constraint::UnknownVariant,
                format!("unknown token lifetime `{code}`, expected short-lived or long-lived"),
            )),
        }
    }
}

impl fmt::Display for TokenLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Opaque token secret. Debug output is redacted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenSecret(String);

impl TokenSecret {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        if raw.is_empty() {
            return Err(FieldError::new(
                Constraint::EmptyRequiredField,
                "access token cannot be empty",
            ));
        }
        if raw.len() > ACCESS_TOKEN_MAX_LENGTH {
            return Err(FieldError::new(Constraint::TooLong, "access token is too long"));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(FieldError::new(
                Constraint::InvalidFormat,
                "access token cannot contain whitespace",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessToken {
    pub access_token: TokenSecret,
    pub token_type: TokenType,
    pub token_lifetime: TokenLifetime,
    pub expire_datetime: Timestamp,
    pub name: Option<DisplayName>,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expire_datetime <= now
    }
}
