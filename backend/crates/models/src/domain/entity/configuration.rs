//! Configuration Entity
//!
//! The CLI configuration: which server to talk to, who the caller is, where
//! run data is stored and which features are switched on.
//!
//! An absent `user` is the valid unauthenticated state. Writes performed on
//! behalf of an identity reject it (see [`ConfigurationEntity::check_context`]).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use bson::{Bson, Document};
use kernel::document::{FieldReader, as_bool, as_i64, as_id, as_string, as_timestamp, insert_some};
use kernel::error::validation::{Constraint, FieldError, ValidationError, Violations, join_path};
use kernel::id::IdentityId;
use kernel::primitives::{PrimitiveAdapter, Timestamp};
use kernel::text::{Trust, check_length};
use regex::Regex;

use super::missing;
use crate::domain::contract::{Contract, EntityType, WriteContext};
use crate::domain::value_object::{
    AccessToken, DisplayName, Email, Endpoint, TokenLifetime, TokenSecret, TokenType,
};

pub const API_BASE_URL: &str = "api_base_url";
pub const USER: &str = "user";
pub const STORAGE: &str = "storage";
pub const FEATURE_FLAGS: &str = "feature_flags";

/// Path reported when an authenticated write finds no identity
pub const IDENTITY_REFERENCE: &str = "identity_reference";

pub const DEFAULT_STORAGE_ENDPOINT: &str = "http://localhost";
pub const DEFAULT_STORAGE_PORT: u16 = 9000;
const STORAGE_TEXT_MAX_LENGTH: usize = 255;

static FLAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("flag name pattern is valid"));

// ============================================================================
// Builder input
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ConfigurationFields {
    pub api_base_url: Option<String>,
    pub user: Option<IdentityReferenceFields>,
    pub storage: Option<StorageFields>,
    pub feature_flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityReferenceFields {
    pub id: Option<IdentityId>,
    pub email: Option<String>,
    pub token: Option<AccessTokenFields>,
}

#[derive(Debug, Clone, Default)]
pub struct AccessTokenFields {
    pub access_token: Option<String>,
    /// defaults to `bearer`
    pub token_type: Option<String>,
    /// defaults to `short-lived`
    pub token_lifetime: Option<String>,
    pub expire_datetime: Option<Timestamp>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StorageFields {
    /// defaults to `minio`
    pub provider: Option<String>,
    pub bucket: Option<String>,
    /// defaults to `http://localhost`
    pub endpoint: Option<String>,
    /// defaults to 9000
    pub port: Option<i64>,
    pub minio_root_user: Option<String>,
    pub minio_root_password: Option<String>,
}

// ============================================================================
// Validated parts
// ============================================================================

/// Non-owning reference to the identity the configuration acts for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityReference {
    pub id: IdentityId,
    pub email: Email,
    pub token: Option<AccessToken>,
}

impl IdentityReference {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id", self.id.to_storage());
        doc.insert("email", self.email.as_str());
        if let Some(token) = &self.token {
            let mut t = Document::new();
            t.insert("access_token", token.access_token.expose());
            t.insert("token_type", token.token_type.code());
            t.insert("token_lifetime", token.token_lifetime.code());
            t.insert("expire_datetime", token.expire_datetime.to_storage());
            insert_some(&mut t, "name", token.name.as_ref().map(|n| n.as_str()));
            doc.insert("token", t);
        }
        doc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageProvider {
    #[default]
    Minio,
}

impl StorageProvider {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            StorageProvider::Minio => "minio",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        if code.eq_ignore_ascii_case("minio") {
            Ok(StorageProvider::Minio)
        } else {
            Err(FieldError::new(
                Constraint::UnknownVariant,
                format!("unsupported storage provider `{code}`, only minio is supported"),
            ))
        }
    }
}

/// Object storage connection parameters (closed shape).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StorageSettings {
    provider: StorageProvider,
    bucket: String,
    endpoint: Endpoint,
    port: u16,
    root_user: String,
    root_password: String,
}

impl StorageSettings {
    pub fn provider(&self) -> StorageProvider {
        self.provider
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn root_user(&self) -> &str {
        &self.root_user
    }

    pub fn root_password(&self) -> &str {
        &self.root_password
    }

    fn build(fields: StorageFields, v: &mut Violations) -> Option<Self> {
        let at = |key: &str| join_path(STORAGE, key);

        let provider = match fields.provider {
            Some(raw) => v.capture(&at("provider"), StorageProvider::from_code(&raw)),
            None => Some(StorageProvider::default()),
        };
        let bucket = v
            .require(&at("bucket"), fields.bucket)
            .and_then(|raw| v.capture(&at("bucket"), non_empty(&raw, "bucket name")));
        let endpoint = v.capture(
            &at("endpoint"),
            Endpoint::new(fields.endpoint.as_deref().unwrap_or(DEFAULT_STORAGE_ENDPOINT)),
        );
        let port = match fields.port {
            Some(raw) => v.capture(&at("port"), port_number(raw)),
            None => Some(DEFAULT_STORAGE_PORT),
        };
        let root_user = v
            .require(&at("minio_root_user"), fields.minio_root_user)
            .and_then(|raw| v.capture(&at("minio_root_user"), non_empty(&raw, "root user")));
        let root_password = v
            .require(&at("minio_root_password"), fields.minio_root_password)
            .and_then(|raw| {
                v.capture(&at("minio_root_password"), secret(raw, "root password"))
            });

        Some(Self {
            provider: provider?,
            bucket: bucket?,
            endpoint: endpoint?,
            port: port?,
            root_user: root_user?,
            root_password: root_password?,
        })
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("provider", self.provider.code());
        doc.insert("bucket", self.bucket.as_str());
        doc.insert("endpoint", self.endpoint.as_str());
        doc.insert("port", i32::from(self.port));
        doc.insert("minio_root_user", self.root_user.as_str());
        doc.insert("minio_root_password", self.root_password.as_str());
        doc
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("root_user", &self.root_user)
            .field("root_password", &"***")
            .finish()
    }
}

fn non_empty(raw: &str, what: &str) -> Result<String, FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldError::new(
            Constraint::EmptyRequiredField,
            format!("{what} cannot be empty"),
        ));
    }
    check_length(value, STORAGE_TEXT_MAX_LENGTH)?;
    Ok(value.to_string())
}

/// Kept byte for byte; surrounding spaces may be part of a secret.
fn secret(raw: String, what: &str) -> Result<String, FieldError> {
    if raw.is_empty() {
        return Err(FieldError::new(
            Constraint::EmptyRequiredField,
            format!("{what} cannot be empty"),
        ));
    }
    check_length(&raw, STORAGE_TEXT_MAX_LENGTH)?;
    Ok(raw)
}

fn port_number(raw: i64) -> Result<u16, FieldError> {
    match u16::try_from(raw) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(FieldError::new(
            Constraint::OutOfRange,
            "port number must be between 1 and 65535",
        )),
    }
}

// ============================================================================
// Entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationEntity {
    api_base_url: Endpoint,
    identity_reference: Option<IdentityReference>,
    storage: Option<StorageSettings>,
    feature_flags: BTreeMap<String, bool>,
}

impl ConfigurationEntity {
    pub fn validate_and_construct(fields: ConfigurationFields) -> Result<Self, ValidationError> {
        Self::build(fields, Trust::Untrusted, Violations::new())
    }

    fn build(
        fields: ConfigurationFields,
        trust: Trust,
        mut v: Violations,
    ) -> Result<Self, ValidationError> {
        let api_base_url = v
            .require(API_BASE_URL, fields.api_base_url)
            .and_then(|raw| v.capture(API_BASE_URL, Endpoint::new(&raw)));

        let identity_reference = fields
            .user
            .and_then(|user| build_identity_reference(user, trust, &mut v));
        let storage = fields
            .storage
            .and_then(|storage| StorageSettings::build(storage, &mut v));

        for name in fields.feature_flags.keys() {
            if !FLAG_NAME.is_match(name) {
                v.violate(
                    join_path(FEATURE_FLAGS, name),
                    Constraint::InvalidFormat,
                    "flag names are lowercase snake_case",
                );
            }
        }

        v.finish()?;
        Ok(Self {
            api_base_url: api_base_url.ok_or_else(|| missing(API_BASE_URL))?,
            identity_reference,
            storage,
            feature_flags: fields.feature_flags,
        })
    }

    pub fn api_base_url(&self) -> &Endpoint {
        &self.api_base_url
    }

    pub fn identity_reference(&self) -> Option<&IdentityReference> {
        self.identity_reference.as_ref()
    }

    pub fn storage(&self) -> Option<&StorageSettings> {
        self.storage.as_ref()
    }

    pub fn feature_flags(&self) -> &BTreeMap<String, bool> {
        &self.feature_flags
    }

    /// Unset flags read as off
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.feature_flags.get(flag).copied().unwrap_or(false)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity_reference.is_some()
    }
}

fn build_identity_reference(
    fields: IdentityReferenceFields,
    trust: Trust,
    v: &mut Violations,
) -> Option<IdentityReference> {
    let id = v.require("user.id", fields.id);
    let email = v
        .require("user.email", fields.email)
        .and_then(|raw| v.capture("user.email", Email::new(&raw)));
    let token = match fields.token {
        Some(token) => Some(build_access_token(token, trust, v)?),
        None => None,
    };
    Some(IdentityReference {
        id: id?,
        email: email?,
        token,
    })
}

fn build_access_token(
    fields: AccessTokenFields,
    trust: Trust,
    v: &mut Violations,
) -> Option<AccessToken> {
    const AT: &str = "user.token";
    let at = |key: &str| join_path(AT, key);

    let access_token = v
        .require(&at("access_token"), fields.access_token)
        .and_then(|raw| v.capture(&at("access_token"), TokenSecret::new(&raw)));
    let token_type = match fields.token_type {
        Some(raw) => v.capture(&at("token_type"), TokenType::from_code(&raw)),
        None => Some(TokenType::default()),
    };
    let token_lifetime = match fields.token_lifetime {
        Some(raw) => v.capture(&at("token_lifetime"), TokenLifetime::from_code(&raw)),
        None => Some(TokenLifetime::default()),
    };
    let expire_datetime = v.require(&at("expire_datetime"), fields.expire_datetime);
    let name = match fields.name {
        Some(raw) => Some(v.capture(&at("name"), DisplayName::new(&raw, trust))?),
        None => None,
    };

    Some(AccessToken {
        access_token: access_token?,
        token_type: token_type?,
        token_lifetime: token_lifetime?,
        expire_datetime: expire_datetime?,
        name,
    })
}

fn read_fields(reader: &mut FieldReader<'_>) -> ConfigurationFields {
    let api_base_url = reader.required(API_BASE_URL, as_string);
    let user = reader.nested(USER, false, |r| IdentityReferenceFields {
        id: r.required("id", as_id),
        email: r.required("email", as_string),
        token: r.nested("token", false, |t| AccessTokenFields {
            access_token: t.required("access_token", as_string),
            token_type: t.optional("token_type", as_string),
            token_lifetime: t.optional("token_lifetime", as_string),
            expire_datetime: t.required("expire_datetime", as_timestamp),
            name: t.optional("name", as_string),
        }),
    });
    let storage = reader.nested(STORAGE, false, |r| StorageFields {
        provider: r.optional("provider", as_string),
        bucket: r.required("bucket", as_string),
        endpoint: r.optional("endpoint", as_string),
        port: r.optional("port", as_i64),
        minio_root_user: r.required("minio_root_user", as_string),
        minio_root_password: r.required("minio_root_password", as_string),
    });
    let feature_flags = reader.entries(FEATURE_FLAGS, as_bool).into_iter().collect();

    ConfigurationFields {
        api_base_url,
        user,
        storage,
        feature_flags,
    }
}

impl Contract for ConfigurationEntity {
    const ENTITY_TYPE: EntityType = EntityType::Configuration;
    const SCHEMA_VERSION: u32 = 2;
    const FIELDS: &'static [&'static str] = &[API_BASE_URL, USER, STORAGE, FEATURE_FLAGS];
    const ID_FIELD: Option<&'static str> = None;
    const VOLATILE_FIELDS: &'static [&'static str] = &[];

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(API_BASE_URL, self.api_base_url.as_str());
        insert_some(
            &mut doc,
            USER,
            self.identity_reference.as_ref().map(|u| u.to_document()),
        );
        insert_some(&mut doc, STORAGE, self.storage.as_ref().map(|s| s.to_document()));
        if !self.feature_flags.is_empty() {
            let flags: Document = self
                .feature_flags
                .iter()
                .map(|(name, on)| (name.clone(), Bson::Boolean(*on)))
                .collect();
            doc.insert(FEATURE_FLAGS, flags);
        }
        doc
    }

    fn from_document(doc: &Document, trust: Trust) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(doc);
        let fields = read_fields(&mut reader);
        reader.deny_unknown();
        Self::build(fields, trust, reader.into_violations())
    }

    /// An authenticated write needs an identity reference.
    fn check_context(&self, context: WriteContext) -> Result<(), ValidationError> {
        match (context, &self.identity_reference) {
            (WriteContext::Authenticated, None) => Err(ValidationError::single(
                IDENTITY_REFERENCE,
                FieldError::new(
                    Constraint::Required,
                    "authentication required: the configuration has no user",
                ),
            )),
            _ => Ok(()),
        }
    }
}
