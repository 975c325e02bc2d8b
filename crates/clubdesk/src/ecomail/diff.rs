//! Field-by-field comparison of a local profile against the remote
//! subscriber object.
//!
//! The remote API is loose about where it puts things (several envelope
//! shapes, custom fields per list or per subscriber, numbers where strings
//! are expected), so every read here probes rather than deserializes.

use serde_json::Value;
use std::collections::BTreeSet;

use super::projection::SubscriberProfile;
use crate::applicants::normalize::clean_phone;

/// One compared field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldDiff {
    pub label: &'static str,
    pub existing: String,
    pub proposed: String,
    pub differs: bool,
}

/// Outcome of comparing a record against the list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SyncDiff {
    pub exists: bool,
    pub has_changes: bool,
    pub fields: Vec<FieldDiff>,
}

const MEMBERSHIP_ALIASES: &[&str] = &["MEMBERSHIP_ID", "CLENSKE_CISLO", "clenske_cislo"];

/// Compares the projected profile with the remote subscriber, if any.
pub fn diff_profile(profile: &SubscriberProfile, remote: Option<&Value>) -> SyncDiff {
    let Some(subscriber) = remote else {
        let fields = proposed_only(profile);
        let has_changes = fields.iter().any(|f| f.differs);
        return SyncDiff {
            exists: false,
            has_changes,
            fields,
        };
    };

    let mut fields = vec![
        email_field(text(subscriber, "email"), profile.email.clone()),
        field("name", text(subscriber, "name"), profile.name.clone()),
        field("surname", text(subscriber, "surname"), profile.surname.clone()),
        phone_field(text(subscriber, "phone"), profile.phone.clone()),
        field("city", text(subscriber, "city"), profile.city.clone()),
        field("birthday", text(subscriber, "birthday"), profile.birthday.clone()),
        field(
            "membership_id",
            remote_membership_id(subscriber).unwrap_or_default(),
            profile.membership_id.clone(),
        ),
    ];
    fields.push(tags_field(subscriber, &profile.tags));

    let has_changes = fields.iter().any(|f| f.differs);
    SyncDiff {
        exists: true,
        has_changes,
        fields,
    }
}

fn proposed_only(profile: &SubscriberProfile) -> Vec<FieldDiff> {
    vec![
        field("email", String::new(), profile.email.clone()),
        field("name", String::new(), profile.name.clone()),
        field("surname", String::new(), profile.surname.clone()),
        field("phone", String::new(), profile.phone.clone()),
        field("city", String::new(), profile.city.clone()),
        field("birthday", String::new(), profile.birthday.clone()),
        field("membership_id", String::new(), profile.membership_id.clone()),
        field("tags", String::new(), profile.tags.join(", ")),
    ]
}

fn field(label: &'static str, existing: String, proposed: String) -> FieldDiff {
    let differs = existing.trim() != proposed.trim();
    FieldDiff {
        label,
        existing,
        proposed,
        differs,
    }
}

/// The API canonicalizes addresses, so case differences alone are not a
/// change.
fn email_field(existing: String, proposed: String) -> FieldDiff {
    let differs = existing.trim().to_lowercase() != proposed.trim().to_lowercase();
    FieldDiff {
        label: "email",
        existing,
        proposed,
        differs,
    }
}

/// Phones are compared after normalization so "777 111 222" does not show
/// as a change against "777111222".
fn phone_field(existing: String, proposed: String) -> FieldDiff {
    let differs = clean_phone(&existing) != clean_phone(&proposed);
    FieldDiff {
        label: "phone",
        existing,
        proposed,
        differs,
    }
}

/// Tags are compared as sets: neither order nor repetition counts.
fn tags_field(subscriber: &Value, proposed: &[String]) -> FieldDiff {
    let existing: BTreeSet<String> = subscriber
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let wanted: BTreeSet<String> = proposed.iter().cloned().collect();
    let differs = existing != wanted;

    FieldDiff {
        label: "tags",
        existing: existing.into_iter().collect::<Vec<_>>().join(", "),
        proposed: proposed.join(", "),
        differs,
    }
}

fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn meaningful(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    // Zero and empty are the API's ways of saying "not set".
    if text.is_empty() || text == "0" {
        None
    } else {
        Some(text)
    }
}

/// Hunts for the membership number across the shapes the API returns it
/// in: subscriber-level custom fields, per-list `c_fields` keyed by list
/// id, or a list array.
fn remote_membership_id(subscriber: &Value) -> Option<String> {
    if let Some(custom) = subscriber.get("custom_fields") {
        for alias in MEMBERSHIP_ALIASES {
            if let Some(found) = custom.get(*alias).and_then(meaningful) {
                return Some(found);
            }
        }
    }

    match subscriber.get("lists") {
        Some(Value::Object(lists)) => {
            for entry in lists.values() {
                if let Some(found) = membership_from_list_entry(entry) {
                    return Some(found);
                }
            }
        }
        Some(Value::Array(lists)) => {
            for entry in lists {
                if let Some(found) = membership_from_list_entry(entry) {
                    return Some(found);
                }
            }
        }
        _ => {}
    }

    None
}

fn membership_from_list_entry(entry: &Value) -> Option<String> {
    for container in ["c_fields", "custom_fields"] {
        if let Some(fields) = entry.get(container) {
            for alias in MEMBERSHIP_ALIASES {
                if let Some(found) = fields.get(*alias).and_then(meaningful) {
                    return Some(found);
                }
            }
        }
    }
    None
}
