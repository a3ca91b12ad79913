// Collaborator record shapes and their normalization.
//
// Host editors and presence backends report the same facts under different
// field names (`resource` vs `resourceRef`, `editable_id` vs
// `targetElementId`, ...). Everything is normalized here, once, into the
// strict `Element` / `PresenceEntry` types so the core never sniffs shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::types::{Element, PresenceEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("element record has no id")]
    MissingElementId,

    #[error("presence record has no subject id")]
    MissingSubjectId,
}

/// An element as reported by a host editor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawElement {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "resourceRef")]
    pub resource_ref: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default, rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A presence row as returned by a presence backend.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawPresence {
    #[serde(default, alias = "subjectId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "targetElementId")]
    pub editable_id: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, alias = "lastSeen")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
}

impl RawElement {
    pub fn normalize(self) -> Result<Element, RecordError> {
        let id = non_empty(self.id).ok_or(RecordError::MissingElementId)?;
        Ok(Element {
            id,
            resource_ref: non_empty(self.resource_ref).or(self.resource).unwrap_or_default(),
            explicit_parent_id: non_empty(self.parent_id).or_else(|| non_empty(self.parent)),
            kind: self.kind,
            label: self.label,
        })
    }
}

impl RawPresence {
    pub fn normalize(self) -> Result<PresenceEntry, RecordError> {
        let subject_id = non_empty(self.user_id).ok_or(RecordError::MissingSubjectId)?;
        Ok(PresenceEntry {
            subject_id,
            target_element_id: non_empty(self.editable_id),
            color: self.color.unwrap_or_default(),
            last_seen: self.last_seen.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            display_name: non_empty(self.display_name),
        })
    }
}

/// Normalize a batch of element records, dropping (and logging) invalid ones.
pub fn normalize_elements(raw: Vec<RawElement>) -> Vec<Element> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, record)| match record.normalize() {
            Ok(element) => Some(element),
            Err(error) => {
                warn!(position, error = %error, "dropping element record");
                None
            }
        })
        .collect()
}

/// Normalize a presence snapshot, dropping (and logging) invalid rows.
pub fn normalize_presence(raw: Vec<RawPresence>) -> Vec<PresenceEntry> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, record)| match record.normalize() {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(position, error = %error, "dropping presence record");
                None
            }
        })
        .collect()
}

/// Parse and normalize a JSON array of element records.
pub fn parse_elements(json: &str) -> Result<Vec<Element>, serde_json::Error> {
    serde_json::from_str::<Vec<RawElement>>(json).map(normalize_elements)
}

/// Parse and normalize a presence snapshot: either a JSON array of rows or
/// an `{"items": [...]}` envelope.
pub fn parse_presence(json: &str) -> Result<Vec<PresenceEntry>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Snapshot {
        Rows(Vec<RawPresence>),
        Envelope { items: Vec<RawPresence> },
    }

    let rows = match serde_json::from_str::<Snapshot>(json)? {
        Snapshot::Rows(rows) | Snapshot::Envelope { items: rows } => rows,
    };
    Ok(normalize_presence(rows))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
