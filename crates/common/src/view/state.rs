// Expand/collapse and selection state of the block map.
//
// Transitions are pure `(state, event) -> state` functions so the view
// controller can be tested without a UI.

use std::collections::HashSet;

use crate::types::{walk_forest, TreeNode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub expanded_ids: HashSet<String>,
    /// Latched once the first non-empty forest has been fully expanded.
    pub has_auto_expanded: bool,
    pub selected_ids: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent<'a> {
    ForestBecameNonEmpty(&'a [TreeNode]),
    ForestBecameEmpty,
    Toggle(&'a str),
    Select(&'a str),
}

impl ViewState {
    pub fn apply(mut self, event: ViewEvent<'_>) -> Self {
        match event {
            ViewEvent::ForestBecameNonEmpty(forest) => {
                if !self.has_auto_expanded {
                    self.expanded_ids = expandable_ids(forest);
                    self.has_auto_expanded = true;
                }
            }
            ViewEvent::ForestBecameEmpty => {
                self.has_auto_expanded = false;
            }
            ViewEvent::Toggle(node_id) => {
                if !self.expanded_ids.remove(node_id) {
                    self.expanded_ids.insert(node_id.to_string());
                }
            }
            ViewEvent::Select(element_id) => {
                self.selected_ids = HashSet::from([element_id.to_string()]);
            }
        }
        self
    }

    /// Fire the forest transition matching a freshly built forest.
    pub fn observe_forest(self, forest: &[TreeNode]) -> Self {
        if forest.is_empty() {
            self.apply(ViewEvent::ForestBecameEmpty)
        } else {
            self.apply(ViewEvent::ForestBecameNonEmpty(forest))
        }
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded_ids.contains(node_id)
    }

    pub fn is_selected(&self, element_id: &str) -> bool {
        self.selected_ids.contains(element_id)
    }
}

/// Every node id in the forest that has at least one child.
pub fn expandable_ids(forest: &[TreeNode]) -> HashSet<String> {
    let mut ids = HashSet::new();
    walk_forest(forest, &mut |node, _| {
        if node.has_children() {
            ids.insert(node.id.clone());
        }
    });
    ids
}
