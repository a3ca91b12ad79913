// Presence entries grouped by the element they target.

use std::collections::HashMap;

use crate::types::PresenceEntry;

/// Snapshot entries bucketed by target element id. Entries without a target
/// share one bucket. Each bucket keeps snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceIndex {
    by_target: HashMap<String, Vec<PresenceEntry>>,
    untargeted: Vec<PresenceEntry>,
}

impl PresenceIndex {
    pub fn build(presence: &[PresenceEntry]) -> Self {
        let mut index = Self::default();
        for entry in presence {
            match entry.target() {
                Some(target) => {
                    index.by_target.entry(target.to_string()).or_default().push(entry.clone())
                }
                None => index.untargeted.push(entry.clone()),
            }
        }
        index
    }

    /// Entries editing the given element, empty when nobody is.
    pub fn on_element(&self, element_id: &str) -> &[PresenceEntry] {
        self.by_target.get(element_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries present on the page without a specific target.
    pub fn untargeted(&self) -> &[PresenceEntry] {
        &self.untargeted
    }

    /// Number of distinct targeted elements.
    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty() && self.untargeted.is_empty()
    }
}
