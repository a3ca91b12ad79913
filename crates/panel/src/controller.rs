// Panel controller: owns every piece of per-view state and turns it into a
// renderable `PanelView`.
//
// Rebuilds are synchronous and run to completion on each input change; the
// async runtime only decides when to call in.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use pagepresence_common::presence::highlight::changed_subjects;
use pagepresence_common::presence::index::PresenceIndex;
use pagepresence_common::tree::build_forest;
use pagepresence_common::types::{Element, PresenceEntry, TreeNode};
use pagepresence_common::view::rows::{
    list_rows, map_rows, ListRow, MapRow, EMPTY_LIST_TEXT, EMPTY_MAP_TEXT,
};
use pagepresence_common::view::state::{ViewEvent, ViewState};

use crate::config::{PanelConfig, ViewMode};
use crate::highlight::HighlightTimer;
use crate::live::LiveIndicator;

/// Receives element selections for the host editor (scroll / select).
pub trait SelectionSink: Send + Sync + 'static {
    fn select_element(&self, element_id: &str);
}

impl<F> SelectionSink for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn select_element(&self, element_id: &str) {
        (self)(element_id)
    }
}

/// What the panel shows at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub mode: ViewMode,
    pub live: bool,
    pub own_color: Option<String>,
    pub body: PanelBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    Empty { message: String },
    List { rows: Vec<ListRow> },
    Map { rows: Vec<MapRow> },
}

impl PanelView {
    pub fn placeholder(mode: ViewMode) -> Self {
        let message = match mode {
            ViewMode::List => EMPTY_LIST_TEXT,
            ViewMode::Map => EMPTY_MAP_TEXT,
        };
        Self { mode, live: false, own_color: None, body: PanelBody::Empty { message: message.to_string() } }
    }
}

#[derive(Debug)]
pub struct PanelController {
    mode: ViewMode,
    short_id_len: usize,
    own_color: Option<String>,
    elements: Vec<Element>,
    snapshot: Vec<PresenceEntry>,
    index: PresenceIndex,
    forest: Vec<TreeNode>,
    view: ViewState,
    selected: Option<String>,
    highlight: HighlightTimer,
    live: LiveIndicator,
}

impl PanelController {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            mode: config.default_view,
            short_id_len: config.short_id_len,
            own_color: None,
            elements: Vec::new(),
            snapshot: Vec::new(),
            index: PresenceIndex::default(),
            forest: Vec::new(),
            view: ViewState::default(),
            selected: None,
            highlight: HighlightTimer::new(config.highlight_duration()),
            live: LiveIndicator::new(config.live_indicator_grace()),
        }
    }

    pub fn set_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.rebuild();
    }

    /// Consume a snapshot in arrival order; the latest delivered one wins.
    pub fn apply_snapshot(&mut self, snapshot: Vec<PresenceEntry>, now: Instant) {
        let changed = changed_subjects(&self.snapshot, &snapshot);
        if !changed.is_empty() {
            debug!(subjects = changed.len(), "presence changed");
        }
        self.highlight.apply(changed, now);
        self.live.mark(now);

        self.index = PresenceIndex::build(&snapshot);
        self.snapshot = snapshot;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.forest = build_forest(&self.elements, &self.snapshot);
        self.view = std::mem::take(&mut self.view).observe_forest(&self.forest);
    }

    pub fn toggle(&mut self, node_id: &str) {
        self.view = std::mem::take(&mut self.view).apply(ViewEvent::Toggle(node_id));
    }

    /// Select an element and ask the host to reveal it. Ids the host never
    /// reported (orphans) are selected locally but not forwarded.
    pub fn select(&mut self, element_id: &str, sink: &dyn SelectionSink) {
        if element_id.is_empty() {
            return;
        }
        self.view = std::mem::take(&mut self.view).apply(ViewEvent::Select(element_id));
        self.selected = Some(element_id.to_string());

        if self.elements.iter().any(|element| element.id == element_id) {
            sink.select_element(element_id);
        } else {
            warn!(element = %element_id, "selected element not found in editor");
        }
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn set_own_color(&mut self, color: impl Into<String>) {
        self.own_color = Some(color.into());
    }

    /// Target sent with heartbeats.
    pub fn selected_target(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn forest(&self) -> &[TreeNode] {
        &self.forest
    }

    pub fn snapshot(&self) -> &[PresenceEntry] {
        &self.snapshot
    }

    /// Expire the highlight and the live badge. Returns true if anything
    /// visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let highlight = self.highlight.expire(now);
        let live = self.live.expire(now);
        highlight || live
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.highlight.next_deadline(), self.live.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drop pending timers on teardown.
    pub fn cancel_timers(&mut self) {
        self.highlight.cancel();
        self.live.clear();
    }

    pub fn render(&self, now: Instant) -> PanelView {
        let highlighted = self.highlight.current(now);
        let body = match self.mode {
            ViewMode::List if self.snapshot.is_empty() => {
                PanelBody::Empty { message: EMPTY_LIST_TEXT.to_string() }
            }
            ViewMode::List => {
                PanelBody::List { rows: list_rows(&self.snapshot, highlighted, self.short_id_len) }
            }
            ViewMode::Map if self.forest.is_empty() => {
                PanelBody::Empty { message: EMPTY_MAP_TEXT.to_string() }
            }
            ViewMode::Map => PanelBody::Map {
                rows: map_rows(&self.forest, &self.index, highlighted, &self.view, self.short_id_len),
            },
        };

        PanelView {
            mode: self.mode,
            live: self.live.is_live(now),
            own_color: self.own_color.clone(),
            body,
        }
    }
}
