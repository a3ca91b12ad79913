// Block hierarchy reconstruction.
//
// The host editor reports its editable elements as a flat list. Parents are
// recovered from explicit parent ids where present and from resource paths
// otherwise. Presence entries that target ids the editor never reported
// ("orphans") are synthesized into the forest next to their most likely
// parent, so no presence information is dropped.

mod orphan;

use std::collections::HashMap;

use tracing::debug;

use crate::path::resource::{ancestors, extract_path, is_root_path};
use crate::types::{Element, PresenceEntry, TreeNode};

/// Build the ordered block forest from the element list and a presence
/// snapshot.
///
/// Pure and deterministic: equal inputs produce equal forests. Never fails;
/// anything that cannot be placed becomes a root.
pub fn build_forest(elements: &[Element], presence: &[PresenceEntry]) -> Vec<TreeNode> {
    let mut drafts = collect_drafts(elements);

    let (mut parents, orphans) = {
        let known = KnownElements::new(&drafts);
        let parents: Vec<Option<usize>> =
            drafts.iter().map(|draft| resolve_parent(draft, &known)).collect();
        let orphans = orphan::place_orphans(presence, &known);
        (parents, orphans)
    };

    detach_cycles(&mut parents, &drafts);

    for placement in orphans {
        parents.push(placement.parent);
        drafts.push(NodeDraft {
            id: placement.id,
            path: placement.path,
            explicit_parent_id: None,
            kind: None,
            label: None,
            resource_ref: String::new(),
            is_orphan: true,
            property_hint: placement.property_hint,
        });
    }

    assemble(drafts, &parents)
}

/// Sort siblings by path (id when the path is empty), tie-broken by id, at
/// every level.
pub fn sort_forest(nodes: &mut [TreeNode]) {
    for node in nodes.iter_mut() {
        sort_forest(&mut node.children);
    }
    nodes.sort_by(|a, b| a.sort_key().cmp(b.sort_key()).then_with(|| a.id.cmp(&b.id)));
}

#[derive(Debug)]
struct NodeDraft {
    id: String,
    path: String,
    explicit_parent_id: Option<String>,
    kind: Option<String>,
    label: Option<String>,
    resource_ref: String,
    is_orphan: bool,
    property_hint: Option<String>,
}

impl NodeDraft {
    fn from_element(element: &Element) -> Self {
        Self {
            id: element.id.clone(),
            path: extract_path(&element.resource_ref).to_string(),
            explicit_parent_id: element.explicit_parent_id.clone(),
            kind: element.kind.clone(),
            label: element.label.clone(),
            resource_ref: element.resource_ref.clone(),
            is_orphan: false,
            property_hint: None,
        }
    }

    fn into_node(self, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            id: self.id,
            path: self.path,
            children,
            is_orphan: self.is_orphan,
            property_hint: self.property_hint,
            kind: self.kind,
            label: self.label,
            resource_ref: self.resource_ref,
        }
    }
}

/// One draft per distinct id. A repeated id overwrites the earlier data but
/// keeps its first-seen slot.
fn collect_drafts(elements: &[Element]) -> Vec<NodeDraft> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(elements.len());
    let mut drafts: Vec<NodeDraft> = Vec::with_capacity(elements.len());

    for element in elements {
        match slots.get(element.id.as_str()) {
            Some(&slot) => {
                debug!(element = %element.id, "duplicate element id, last report wins");
                drafts[slot] = NodeDraft::from_element(element);
            }
            None => {
                slots.insert(element.id.as_str(), drafts.len());
                drafts.push(NodeDraft::from_element(element));
            }
        }
    }

    drafts
}

/// Lookup tables over the reported elements.
pub(crate) struct KnownElements<'a> {
    by_id: HashMap<&'a str, usize>,
    by_path: HashMap<&'a str, usize>,
    ids: Vec<&'a str>,
}

impl<'a> KnownElements<'a> {
    fn new(drafts: &'a [NodeDraft]) -> Self {
        let mut by_id = HashMap::with_capacity(drafts.len());
        let mut by_path = HashMap::with_capacity(drafts.len());
        let mut ids = Vec::with_capacity(drafts.len());

        for (index, draft) in drafts.iter().enumerate() {
            by_id.insert(draft.id.as_str(), index);
            ids.push(draft.id.as_str());
            if !draft.path.is_empty() {
                by_path.insert(draft.path.as_str(), index);
            }
        }

        Self { by_id, by_path, ids }
    }

    pub(crate) fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Nearest ancestor path that belongs to a known element.
    pub(crate) fn parent_for_path(&self, path: &str) -> Option<usize> {
        if is_root_path(path) {
            return None;
        }
        ancestors(path).find_map(|ancestor| self.by_path.get(ancestor).copied())
    }

    /// Known ids in first-reported order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.ids.iter().copied().enumerate()
    }
}

fn resolve_parent(draft: &NodeDraft, known: &KnownElements<'_>) -> Option<usize> {
    if let Some(parent) = draft
        .explicit_parent_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| known.index_of(id))
    {
        return Some(parent);
    }
    known.parent_for_path(&draft.path)
}

/// Explicit parent ids can disagree with paths and form loops. Any element
/// whose parent chain leads back to itself becomes a root, checked in input
/// order.
fn detach_cycles(parents: &mut [Option<usize>], drafts: &[NodeDraft]) {
    for start in 0..parents.len() {
        let mut cursor = parents[start];
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == start {
                debug!(element = %drafts[start].id, "parent cycle, attaching as root");
                parents[start] = None;
                break;
            }
            steps += 1;
            if steps > parents.len() {
                break;
            }
            cursor = parents[current];
        }
    }
}

fn assemble(drafts: Vec<NodeDraft>, parents: &[Option<usize>]) -> Vec<TreeNode> {
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); drafts.len()];
    let mut roots = Vec::new();
    for (index, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children_of[*parent].push(index),
            None => roots.push(index),
        }
    }

    let mut slots: Vec<Option<NodeDraft>> = drafts.into_iter().map(Some).collect();
    let mut forest: Vec<TreeNode> =
        roots.into_iter().filter_map(|root| materialize(root, &children_of, &mut slots)).collect();
    sort_forest(&mut forest);
    forest
}

fn materialize(
    index: usize,
    children_of: &[Vec<usize>],
    slots: &mut [Option<NodeDraft>],
) -> Option<TreeNode> {
    let draft = slots[index].take()?;
    let children = children_of[index]
        .iter()
        .filter_map(|child| materialize(*child, children_of, slots))
        .collect();
    Some(draft.into_node(children))
}
