// Change detection between successive presence snapshots.

use std::collections::{BTreeSet, HashMap};

use crate::types::PresenceEntry;

/// Subjects to highlight after a snapshot change.
pub type HighlightSet = BTreeSet<String>;

/// Milliseconds a highlight stays visible.
pub const HIGHLIGHT_MS: u64 = 1200;

/// Subjects in `current` that are new or whose target element changed.
///
/// Subjects that left are not reported; they no longer render. A missing
/// target compares equal to a missing target.
pub fn changed_subjects(previous: &[PresenceEntry], current: &[PresenceEntry]) -> HighlightSet {
    let before: HashMap<&str, Option<&str>> =
        previous.iter().map(|entry| (entry.subject_id.as_str(), entry.target())).collect();

    current
        .iter()
        .filter(|entry| match before.get(entry.subject_id.as_str()) {
            Some(target) => *target != entry.target(),
            None => true,
        })
        .map(|entry| entry.subject_id.clone())
        .collect()
}
