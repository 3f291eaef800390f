//! Network endpoint and repository URL value objects

use std::sync::LazyLock;

use derive_more::Display;
use kernel::error::validation::{Constraint, FieldError};
use kernel::text::check_length;
use regex::Regex;

pub const URL_MAX_LENGTH: usize = 2048;

/// `http(s)://host[:port]`, nothing after the authority
static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?)://([^/\s:@]+|\[[0-9A-Fa-f:.]+\])(?::(\d{1,5}))?$")
        .expect("endpoint pattern is valid")
});

static REPOSITORY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?|git)://[^/\s]+(?:/\S*)?$").expect("repository url pattern is valid")
});

/// Base URL of a service (`http://localhost:8058`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{url}")]
pub struct Endpoint {
    url: String,
    host: String,
    port: Option<u16>,
    secure: bool,
}

impl Endpoint {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(FieldError::new(
                Constraint::EmptyRequiredField,
                "endpoint cannot be empty",
            ));
        }
        check_length(url, URL_MAX_LENGTH)?;

        let caps = ENDPOINT.captures(url).ok_or_else(|| {
            FieldError::new(
                Constraint::InvalidFormat,
                "expected http(s)://host[:port] without a path",
            )
        })?;

        let port = match caps.get(3) {
            None => None,
            Some(m) => match m.as_str().parse::<u16>() {
                Ok(p) if p > 0 => Some(p),
                _ => {
                    return Err(FieldError::new(
                        Constraint::OutOfRange,
                        "port number must be between 1 and 65535",
                    ));
                }
            },
        };

        Ok(Self {
            url: url.to_string(),
            host: caps[2].to_string(),
            port,
            secure: &caps[1] == "https",
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if the URL carries one
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

/// Source repository of a workflow (`https://…`, `http://…`, `git://…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct RepositoryUrl(String);

impl RepositoryUrl {
    pub fn new(raw: &str) -> Result<Self, FieldError> {
        let url = raw.trim();
        check_length(url, URL_MAX_LENGTH)?;
        if !REPOSITORY_URL.is_match(url) {
            return Err(FieldError::new(
                Constraint::InvalidFormat,
                "invalid repository URL, expected http(s):// or git://",
            ));
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_valid() {
        let e = Endpoint::new("http://localhost:8058").unwrap();
        assert_eq!(e.host(), "localhost");
        assert_eq!(e.port(), Some(8058));
        assert!(!e.is_secure());
        assert_eq!(e.to_string(), "http://localhost:8058");

        let e = Endpoint::new("https://api.example.org").unwrap();
        assert_eq!(e.port(), None);
        assert!(e.is_secure());
    }

    #[test]
    fn test_endpoint_invalid() {
        assert!(Endpoint::new("localhost:8058").is_err());
        assert!(Endpoint::new("ftp://localhost").is_err());
        assert!(Endpoint::new("http://localhost:8058/api").is_err());
        assert!(Endpoint::new("http://").is_err());
        assert!(Endpoint::new("http://local host").is_err());
    }

    #[test]
    fn test_endpoint_port_range() {
        assert_eq!(
            Endpoint::new("http://localhost:0").unwrap_err().constraint,
            Constraint::OutOfRange
        );
        assert_eq!(
            Endpoint::new("http://localhost:70000").unwrap_err().constraint,
            Constraint::OutOfRange
        );
        assert!(Endpoint::new("http://localhost:65535").is_ok());
    }

    #[test]
    fn test_repository_url() {
        assert!(RepositoryUrl::new("https://github.com/nf-core/rnaseq").is_ok());
        assert!(RepositoryUrl::new("git://example.org/repo.git").is_ok());
        assert!(RepositoryUrl::new("github.com/nf-core/rnaseq").is_err());
        assert!(RepositoryUrl::new("https://").is_err());
    }
}
