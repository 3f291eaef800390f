//! Permission Value Object
//!
//! Owners, editors and viewers of a shared resource, referenced by identity
//! id only. Viewers may include the public wildcard `*`.
//!
//! ## 不変条件
//! - no identity appears twice in one list
//! - the three lists are pairwise disjoint (an owner is not also an editor)

use std::collections::HashSet;
use std::fmt;

use bson::{Bson, Document};
use kernel::error::validation::{Constraint, FieldError, ValidationError, Violations};
use kernel::id::IdentityId;
use kernel::primitives::PrimitiveAdapter;

pub const OWNERS: &str = "owners";
pub const EDITORS: &str = "editors";
pub const VIEWERS: &str = "viewers";

pub const PUBLIC_WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viewer {
    /// Anyone, including unauthenticated callers
    Public,
    Identity(IdentityId),
}

impl Viewer {
    fn to_bson(self) -> Bson {
        match self {
            Viewer::Public => Bson::String(PUBLIC_WILDCARD.to_string()),
            Viewer::Identity(id) => Bson::ObjectId(id.to_storage()),
        }
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewer::Public => f.write_str(PUBLIC_WILDCARD),
            Viewer::Identity(id) => write!(f, "{id}"),
        }
    }
}

/// Read a viewer entry: the wildcard or an identifier in either form.
pub fn as_viewer(value: &Bson) -> Result<Viewer, FieldError> {
    match value {
        Bson::String(s) if s == PUBLIC_WILDCARD => Ok(Viewer::Public),
        other => kernel::document::as_id(other).map(Viewer::Identity),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Permission {
    owners: Vec<IdentityId>,
    editors: Vec<IdentityId>,
    viewers: Vec<Viewer>,
}

impl Permission {
    pub fn new(
        owners: Vec<IdentityId>,
        editors: Vec<IdentityId>,
        viewers: Vec<Viewer>,
    ) -> Result<Self, ValidationError> {
        let mut v = Violations::new();
        let mut seen: HashSet<IdentityId> = HashSet::new();

        let lists = [
            (OWNERS, owners.clone()),
            (EDITORS, editors.clone()),
            (
                VIEWERS,
                viewers
                    .iter()
                    .filter_map(|viewer| match viewer {
                        Viewer::Identity(id) => Some(*id),
                        Viewer::Public => None,
                    })
                    .collect(),
            ),
        ];
        for (list, ids) in lists {
            let mut in_list: HashSet<IdentityId> = HashSet::new();
            for (i, id) in ids.iter().enumerate() {
                let path = format!("{list}[{i}]");
                if !in_list.insert(*id) {
                    v.violate(path, Constraint::Duplicate, format!("{id} is listed twice"));
                } else if !seen.insert(*id) {
                    v.violate(
                        path,
                        Constraint::Conflict,
                        format!("{id} already holds a higher permission"),
                    );
                }
            }
        }
        if viewers.iter().filter(|x| **x == Viewer::Public).count() > 1 {
            v.violate(VIEWERS, Constraint::Duplicate, "public wildcard listed twice");
        }

        v.finish_with(|| Self {
            owners,
            editors,
            viewers,
        })
    }

    /// Single owner, nothing else
    pub fn owned_by(owner: IdentityId) -> Self {
        Self {
            owners: vec![owner],
            editors: Vec::new(),
            viewers: Vec::new(),
        }
    }

    pub fn owners(&self) -> &[IdentityId] {
        &self.owners
    }

    pub fn editors(&self) -> &[IdentityId] {
        &self.editors
    }

    pub fn viewers(&self) -> &[Viewer] {
        &self.viewers
    }

    pub fn is_public(&self) -> bool {
        self.viewers.contains(&Viewer::Public)
    }

    pub fn is_owner(&self, id: IdentityId) -> bool {
        self.owners.contains(&id)
    }

    pub fn can_edit(&self, id: IdentityId) -> bool {
        self.is_owner(id) || self.editors.contains(&id)
    }

    pub fn can_view(&self, id: IdentityId) -> bool {
        self.can_edit(id) || self.is_public() || self.viewers.contains(&Viewer::Identity(id))
    }

    pub(crate) fn to_document(&self) -> Document {
        let ids = |list: &[IdentityId]| -> Vec<Bson> {
            list.iter().map(|id| Bson::ObjectId(id.to_storage())).collect()
        };
        let mut doc = Document::new();
        doc.insert(OWNERS, ids(&self.owners));
        doc.insert(EDITORS, ids(&self.editors));
        doc.insert(
            VIEWERS,
            self.viewers.iter().map(|v| v.to_bson()).collect::<Vec<_>>(),
        );
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_checks() {
        let owner = IdentityId::new();
        let editor = IdentityId::new();
        let viewer = IdentityId::new();
        let stranger = IdentityId::new();
        let p = Permission::new(vec![owner], vec![editor], vec![Viewer::Identity(viewer)]).unwrap();
        assert!(p.can_edit(owner));
        assert!(p.can_edit(editor));
        assert!(!p.can_edit(viewer));
        assert!(p.can_view(viewer));
        assert!(!p.can_view(stranger));
        assert!(!p.is_public());
    }

    #[test]
    fn test_public_viewers() {
        let p = Permission::new(vec![IdentityId::new()], vec![], vec![Viewer::Public]).unwrap();
        assert!(p.is_public());
        assert!(p.can_view(IdentityId::new()));
    }

    #[test]
    fn test_duplicates_reported_by_index() {
        let a = IdentityId::new();
        let err = Permission::new(vec![a, a], vec![], vec![]).unwrap_err();
        let v = err.at("owners[1]").unwrap();
        assert_eq!(v.constraint, Constraint::Duplicate);
    }

    #[test]
    fn test_lists_are_disjoint() {
        let a = IdentityId::new();
        let err = Permission::new(vec![a], vec![], vec![Viewer::Identity(a)]).unwrap_err();
        assert_eq!(err.at("viewers[0]").unwrap().constraint, Constraint::Conflict);
    }

    #[test]
    fn test_viewer_reader() {
        assert_eq!(as_viewer(&Bson::String("*".into())).unwrap(), Viewer::Public);
        let id = IdentityId::new();
        assert_eq!(
            as_viewer(&Bson::String(id.to_wire())).unwrap(),
            Viewer::Identity(id)
        );
        assert!(as_viewer(&Bson::String("everyone".into())).is_err());
    }
}
