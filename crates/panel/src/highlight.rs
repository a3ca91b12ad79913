// Fire-once timer around the most recent HighlightSet.
//
// A non-empty diff replaces whatever is pending and restarts the clock; an
// empty diff leaves the pending set alone. The set is visible until its
// deadline, then reads as empty.

use std::time::Duration;

use tokio::time::Instant;

use pagepresence_common::presence::highlight::{HighlightSet, HIGHLIGHT_MS};

#[derive(Debug, Clone)]
pub struct HighlightTimer {
    lifetime: Duration,
    pending: Option<(HighlightSet, Instant)>,
}

impl Default for HighlightTimer {
    fn default() -> Self {
        Self::new(Duration::from_millis(HIGHLIGHT_MS))
    }
}

impl HighlightTimer {
    pub fn new(lifetime: Duration) -> Self {
        Self { lifetime, pending: None }
    }

    /// Start showing `set`. Returns whether the pending set changed.
    pub fn apply(&mut self, set: HighlightSet, now: Instant) -> bool {
        if set.is_empty() {
            return false;
        }
        self.pending = Some((set, now + self.lifetime));
        true
    }

    /// Highlighted subjects at `now`.
    pub fn current(&self, now: Instant) -> &HighlightSet {
        static EMPTY: HighlightSet = HighlightSet::new();
        match &self.pending {
            Some((set, deadline)) if now < *deadline => set,
            _ => &EMPTY,
        }
    }

    /// Drop the set once its deadline passed. Returns true if it was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
