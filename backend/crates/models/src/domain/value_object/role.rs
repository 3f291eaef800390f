use std::collections::BTreeSet;
use std::fmt;

use kernel::error::validation::{Constraint, FieldError};

/// Closed role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    User,
    Admin,
    /// Non-human principal (workers, CI)
    Service,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Service];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            User => "user",
            Admin => "admin",
            Service => "service",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        use Role::*;
        match code {
            "user" => Ok(User),
            "admin" => Ok(Admin),
            "service" => Ok(Service),
            _ => Err(FieldError::new(
                Constraint::UnknownVariant,
                format!("unknown role `{code}`, expected one of user, admin, service"),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Non-empty set of roles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Build from a list; listing a role twice is rejected rather than merged.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, FieldError> {
        let mut set = BTreeSet::new();
        for role in roles {
            if !set.insert(role) {
                return Err(FieldError::new(
                    Constraint::Duplicate,
                    format!("role `{role}` listed more than once"),
                ));
            }
        }
        if set.is_empty() {
            return Err(FieldError::new(
                Constraint::EmptyRequiredField,
                "at least one role is required",
            ));
        }
        Ok(Self(set))
    }

    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// Roles in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.code()).collect()
    }
}
