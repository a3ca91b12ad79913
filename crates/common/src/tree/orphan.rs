// Placement of presence targets that no reported element matches.
//
// Orphan ids are usually properties or fields below a block: either a
// reference / raw path (`urn:conn:/page/card/jcr:content/title`) or an id
// derived from the block id (`{blockId}_title`, `{blockId}-text`).

use std::collections::HashSet;

use tracing::debug;

use super::KnownElements;
use crate::path::resource::{extract_path, last_segment};
use crate::types::PresenceEntry;

/// Characters that may follow a parent id inside a derived orphan id.
const ID_SEPARATORS: [u8; 4] = [b'_', b'-', b'.', b'/'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OrphanPlacement {
    pub id: String,
    /// Candidate path when the path heuristic placed the orphan, else empty.
    pub path: String,
    pub parent: Option<usize>,
    pub property_hint: Option<String>,
}

/// Distinct orphan targets in first-seen order, each with a parent slot.
pub(super) fn place_orphans(
    presence: &[PresenceEntry],
    known: &KnownElements<'_>,
) -> Vec<OrphanPlacement> {
    let mut seen = HashSet::new();
    presence
        .iter()
        .filter_map(PresenceEntry::target)
        .filter(|target| !known.contains_id(target))
        .filter(|target| seen.insert(*target))
        .map(|target| place_orphan(target, known))
        .collect()
}

fn place_orphan(orphan_id: &str, known: &KnownElements<'_>) -> OrphanPlacement {
    let candidate = extract_path(orphan_id);

    if let Some(parent) = known.parent_for_path(candidate) {
        debug!(orphan = %orphan_id, path = %candidate, parent, heuristic = "path", "placed orphan");
        return OrphanPlacement {
            id: orphan_id.to_string(),
            path: candidate.to_string(),
            parent: Some(parent),
            property_hint: last_segment(candidate).map(str::to_string),
        };
    }

    if let Some((parent, prefix_len)) = longest_id_prefix(orphan_id, known) {
        let remainder = &orphan_id[prefix_len + 1..];
        debug!(orphan = %orphan_id, parent, heuristic = "id_prefix", "placed orphan");
        return OrphanPlacement {
            id: orphan_id.to_string(),
            path: String::new(),
            parent: Some(parent),
            property_hint: (!remainder.is_empty()).then(|| remainder.to_string()),
        };
    }

    debug!(orphan = %orphan_id, path = %candidate, heuristic = "none", "orphan attached as root");
    OrphanPlacement {
        id: orphan_id.to_string(),
        path: String::new(),
        parent: None,
        property_hint: None,
    }
}

/// Longest known id that is a strict prefix of `orphan_id` and is directly
/// followed by a separator. Ties go to the first-reported id.
fn longest_id_prefix(orphan_id: &str, known: &KnownElements<'_>) -> Option<(usize, usize)> {
    let bytes = orphan_id.as_bytes();
    let mut best: Option<(usize, usize)> = None;

    for (index, id) in known.ids() {
        let len = id.len();
        if len >= bytes.len() || len <= best.map_or(0, |(_, best_len)| best_len) {
            continue;
        }
        if ID_SEPARATORS.contains(&bytes[len]) && orphan_id.starts_with(id) {
            best = Some((index, len));
        }
    }

    best
}
