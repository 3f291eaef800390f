//! Standard Migration Steps
//!
//! Each step maps the payload of one version to the next. A step never
//! guesses: a field combination it cannot map is reported as
//! [`Unmigratable`] and the record is left untouched.

use bson::{Bson, Document};
use kernel::error::decode::DecodeError;
use kernel::error::migration::Unmigratable;
use kernel::primitives::{PrimitiveAdapter, Timestamp};

/// Move `old` to `new`. Both present with different values is a conflict.
fn rename(doc: &mut Document, old: &str, new: &str) -> Result<(), Unmigratable> {
    let Some(value) = doc.remove(old) else {
        return Ok(());
    };
    match doc.get(new) {
        Some(existing) if *existing != value => Err(Unmigratable::new(
            old,
            format!("conflicts with `{new}`, which holds a different value"),
        )),
        Some(_) => Ok(()),
        None => {
            doc.insert(new, value);
            Ok(())
        }
    }
}

fn nested_mut<'a>(
    doc: &'a mut Document,
    key: &str,
    path: &str,
) -> Result<Option<&'a mut Document>, Unmigratable> {
    match doc.get_mut(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Document(inner)) => Ok(Some(inner)),
        Some(_) => Err(Unmigratable::new(path, "is not a mapping")),
    }
}

// ============================================================================
// configuration
// ============================================================================

/// v1 to v2: `base_url` → `api_base_url`, `s3` → `storage`; the embedded
/// user keeps only its id, email and token.
pub fn configuration_v1_to_v2(mut doc: Document) -> Result<Document, Unmigratable> {
    rename(&mut doc, "base_url", "api_base_url")?;
    rename(&mut doc, "s3", "storage")?;

    if let Some(user) = nested_mut(&mut doc, "user", "user")? {
        // roles and groups belong to the identity record
        user.remove("is_admin");
        user.remove("groups");
        if let Some(token) = nested_mut(user, "token", "user.token")? {
            for stale in ["id", "_id", "user_id", "sub", "created_at"] {
                token.remove(stale);
            }
            if let Some(Bson::String(expiry)) = token.get("expire_datetime") {
                if let Err(DecodeError::AmbiguousTimestamp { .. }) = Timestamp::from_wire(expiry) {
                    return Err(Unmigratable::new(
                        "user.token.expire_datetime",
                        format!("`{expiry}` has no UTC offset"),
                    ));
                }
            }
        }
    }
    Ok(doc)
}

// ============================================================================
// identity
// ============================================================================

/// v1 to v2: `is_admin` → `roles`, `groups` → `group_ids`,
/// `registration_date` → `created_at`; a missing display name is taken from
/// the email local part.
pub fn identity_v1_to_v2(mut doc: Document) -> Result<Document, Unmigratable> {
    let is_admin = match doc.remove("is_admin") {
        None | Some(Bson::Null) => false,
        Some(Bson::Boolean(b)) => b,
        Some(other) => {
            return Err(Unmigratable::new(
                "is_admin",
                format!("is not a boolean: {other}"),
            ));
        }
    };
    if !doc.contains_key("roles") {
        let roles = if is_admin { vec!["admin", "user"] } else { vec!["user"] };
        doc.insert("roles", roles);
    }

    if !doc.contains_key("display_name") {
        let local = match doc.get("email") {
            Some(Bson::String(email)) => email.split('@').next().unwrap_or_default().to_string(),
            _ => {
                return Err(Unmigratable::new(
                    "email",
                    "is missing, so no display name can be derived",
                ));
            }
        };
        doc.insert("display_name", local);
    }

    if let Some(groups) = doc.remove("groups") {
        let Bson::Array(items) = groups else {
            return Err(Unmigratable::new("groups", "is not a list"));
        };
        let ids = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Bson::Document(group) => group
                    .get("id")
                    .or_else(|| group.get("_id"))
                    .cloned()
                    .ok_or_else(|| Unmigratable::new(format!("groups[{i}]"), "has no id")),
                id @ (Bson::ObjectId(_) | Bson::String(_)) => Ok(id),
                _ => Err(Unmigratable::new(format!("groups[{i}]"), "is not a group")),
            })
            .collect::<Result<Vec<Bson>, _>>()?;
        if !doc.contains_key("group_ids") {
            doc.insert("group_ids", ids);
        }
    }

    rename(&mut doc, "registration_date", "created_at")?;
    Ok(doc)
}

// ============================================================================
// run
// ============================================================================

/// Legacy status vocabulary
fn map_status(legacy: &str) -> Option<&'static str> {
    match legacy {
        "queued" | "pending" => Some("pending"),
        "running" => Some("running"),
        "done" | "succeeded" => Some("succeeded"),
        "error" | "failed" => Some("failed"),
        "cancelled" => Some("cancelled"),
        _ => None,
    }
}

/// v1 to v2: `execution_time` → `started_at`,
/// `registration_time` → `created_at`, legacy status names mapped.
pub fn run_v1_to_v2(mut doc: Document) -> Result<Document, Unmigratable> {
    let executed = doc.contains_key("execution_time");
    rename(&mut doc, "execution_time", "started_at")?;
    rename(&mut doc, "registration_time", "created_at")?;

    match doc.get("status") {
        None | Some(Bson::Null) if executed => {
            return Err(Unmigratable::new(
                "status",
                "is absent but the run has an execution time",
            ));
        }
        None | Some(Bson::Null) => {}
        Some(Bson::String(legacy)) => {
            let status = map_status(legacy).ok_or_else(|| {
                Unmigratable::new("status", format!("has unknown legacy value `{legacy}`"))
            })?;
            doc.insert("status", status);
        }
        Some(other) => {
            return Err(Unmigratable::new("status", format!("is not text: {other}")));
        }
    }
    Ok(doc)
}
