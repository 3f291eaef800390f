//! Identity Entity
//!
//! A user or service principal. Other entities refer to it by id only.

use std::collections::HashSet;

use bson::{Bson, Document};
use kernel::document::{FieldReader, as_blob, as_bool, as_id, as_string, as_timestamp, insert_some};
use kernel::error::validation::{Constraint, ValidationError, Violations};
use kernel::id::{GroupId, IdentityId};
use kernel::primitives::{BinaryBlob, PrimitiveAdapter, Timestamp};
use kernel::text::Trust;

use super::{ensure_id, missing};
use crate::domain::contract::{Contract, EntityType};
use crate::domain::value_object::{DisplayName, Email, Role, RoleSet};

pub const ID: &str = "id";
pub const EMAIL: &str = "email";
pub const DISPLAY_NAME: &str = "display_name";
pub const ROLES: &str = "roles";
pub const GROUP_IDS: &str = "group_ids";
pub const IS_ACTIVE: &str = "is_active";
pub const AVATAR: &str = "avatar";
pub const CREATED_AT: &str = "created_at";

/// Avatar images are thumbnails
pub const AVATAR_MAX_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct IdentityFields {
    /// generated when absent
    pub id: Option<IdentityId>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// role codes (`user`, `admin`, `service`)
    pub roles: Vec<String>,
    pub group_ids: Vec<GroupId>,
    pub is_active: bool,
    pub avatar: Option<BinaryBlob>,
    /// now when absent
    pub created_at: Option<Timestamp>,
}

impl Default for IdentityFields {
    fn default() -> Self {
        Self {
            id: None,
            email: None,
            display_name: None,
            roles: Vec::new(),
            group_ids: Vec::new(),
            is_active: true,
            avatar: None,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityEntity {
    id: IdentityId,
    email: Email,
    display_name: DisplayName,
    roles: RoleSet,
    group_ids: Vec<GroupId>,
    is_active: bool,
    avatar: Option<BinaryBlob>,
    created_at: Timestamp,
}

impl IdentityEntity {
    pub fn validate_and_construct(fields: IdentityFields) -> Result<Self, ValidationError> {
        Self::build(fields, Trust::Untrusted, Violations::new())
    }

    fn build(fields: IdentityFields, trust: Trust, mut v: Violations) -> Result<Self, ValidationError> {
        let email = v
            .require(EMAIL, fields.email)
            .and_then(|raw| v.capture(EMAIL, Email::new(&raw)));
        let display_name = v
            .require(DISPLAY_NAME, fields.display_name)
            .and_then(|raw| v.capture(DISPLAY_NAME, DisplayName::new(&raw, trust)));

        let roles = read_roles(&fields.roles, &mut v);

        let mut seen = HashSet::new();
        for (i, group) in fields.group_ids.iter().enumerate() {
            if !seen.insert(*group) {
                v.violate(
                    format!("{GROUP_IDS}[{i}]"),
                    Constraint::Duplicate,
                    format!("group {group} is listed twice"),
                );
            }
        }

        if let Some(avatar) = fields.avatar.as_ref().filter(|a| a.len() > AVATAR_MAX_BYTES) {
            v.violate(
                AVATAR,
                Constraint::TooLong,
                format!(
                    "avatar is {} bytes, maximum {AVATAR_MAX_BYTES}",
                    avatar.len()
                ),
            );
        }

        v.finish()?;
        match (email, display_name, roles) {
            (Some(email), Some(display_name), Some(roles)) => Ok(Self {
                id: ensure_id(fields.id),
                email,
                display_name,
                roles,
                group_ids: fields.group_ids,
                is_active: fields.is_active,
                avatar: fields.avatar,
                created_at: fields.created_at.unwrap_or_else(Timestamp::now),
            }),
            _ => Err(missing(ROLES)),
        }
    }

    pub fn id(&self) -> IdentityId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }

    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_ids
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn avatar(&self) -> Option<&BinaryBlob> {
        self.avatar.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Builder input holding this entity's values, for deriving a modified
    /// copy.
    pub fn to_fields(&self) -> IdentityFields {
        IdentityFields {
            id: Some(self.id),
            email: Some(self.email.to_string()),
            display_name: Some(self.display_name.to_string()),
            roles: self.roles.codes().into_iter().map(String::from).collect(),
            group_ids: self.group_ids.clone(),
            is_active: self.is_active,
            avatar: self.avatar.clone(),
            created_at: Some(self.created_at),
        }
    }
}

/// Every code must name a role before the set itself is judged.
fn read_roles(codes: &[String], v: &mut Violations) -> Option<RoleSet> {
    if codes.is_empty() {
        v.violate(ROLES, Constraint::EmptyRequiredField, "at least one role is required");
        return None;
    }
    let mut roles = Vec::with_capacity(codes.len());
    for (i, code) in codes.iter().enumerate() {
        roles.push(v.capture(&format!("{ROLES}[{i}]"), Role::from_code(code)));
    }
    let roles: Option<Vec<Role>> = roles.into_iter().collect();
    v.capture(ROLES, RoleSet::new(roles?))
}

impl Contract for IdentityEntity {
    const ENTITY_TYPE: EntityType = EntityType::Identity;
    const SCHEMA_VERSION: u32 = 2;
    const FIELDS: &'static [&'static str] = &[
        ID,
        EMAIL,
        DISPLAY_NAME,
        ROLES,
        GROUP_IDS,
        IS_ACTIVE,
        AVATAR,
        CREATED_AT,
    ];

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(ID, self.id.to_storage());
        doc.insert(EMAIL, self.email.as_str());
        doc.insert(DISPLAY_NAME, self.display_name.as_str());
        doc.insert(ROLES, self.roles.codes());
        doc.insert(
            GROUP_IDS,
            self.group_ids
                .iter()
                .map(|g| Bson::ObjectId(g.to_storage()))
                .collect::<Vec<_>>(),
        );
        doc.insert(IS_ACTIVE, self.is_active);
        insert_some(&mut doc, AVATAR, self.avatar.as_ref().map(|a| a.to_storage()));
        doc.insert(CREATED_AT, self.created_at.to_storage());
        doc
    }

    fn from_document(doc: &Document, trust: Trust) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(doc);
        let fields = IdentityFields {
            id: reader.optional(ID, as_id),
            email: reader.required(EMAIL, as_string),
            display_name: reader.required(DISPLAY_NAME, as_string),
            roles: reader.list(ROLES, true, as_string),
            group_ids: reader.list(GROUP_IDS, false, as_id),
            is_active: reader.optional(IS_ACTIVE, as_bool).unwrap_or(true),
            avatar: reader.optional(AVATAR, as_blob),
            created_at: reader.optional(CREATED_AT, as_timestamp),
        };
        reader.deny_unknown();
        Self::build(fields, trust, reader.into_violations())
    }
}
