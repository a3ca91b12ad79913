// Core domain types shared across all PagePresence crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A structural unit of the edited document, as reported by the host editor.
///
/// Ids are stable across refreshes while the element exists, but not across
/// document reloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    /// Opaque resource identifier, e.g. `urn:conn:/content/page/jcr:content/root`.
    pub resource_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_parent_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Element {
    pub fn new(id: impl Into<String>, resource_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_ref: resource_ref.into(),
            explicit_parent_id: None,
            kind: None,
            label: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.explicit_parent_id = Some(parent_id.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One subject's presence on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub subject_id: String,
    /// Element being edited. May reference an id the element set does not
    /// contain (an orphan), or be `None` when the subject is only viewing.
    #[serde(default)]
    pub target_element_id: Option<String>,
    pub color: String,
    pub last_seen: DateTime<Utc>,
    /// Name shown for the subject. `subject_id` stays the stable identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PresenceEntry {
    pub fn new(
        subject_id: impl Into<String>,
        target_element_id: Option<&str>,
        color: impl Into<String>,
        last_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            target_element_id: target_element_id.map(str::to_string),
            color: color.into(),
            last_seen,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name, falling back to the subject id.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().filter(|name| !name.is_empty()).unwrap_or(&self.subject_id)
    }

    /// Target id, treating an empty string the same as no target.
    pub fn target(&self) -> Option<&str> {
        self.target_element_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A node of the reconstructed block hierarchy.
///
/// Built fresh on every input change; only `id` carries identity across
/// rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    /// Structural path; empty for orphans placed without a path.
    pub path: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    /// Synthesized for a presence target that no element reported.
    pub is_orphan: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_hint: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_ref: String,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Key siblings are ordered by: the path, or the id when the path is empty.
    pub fn sort_key(&self) -> &str {
        if self.path.is_empty() {
            &self.id
        } else {
            &self.path
        }
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Find a node anywhere in a forest.
pub fn find_in_forest<'a>(forest: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    forest.iter().find_map(|root| root.find(id))
}

/// Visit every node of a forest in depth-first pre-order.
pub fn walk_forest<'a>(forest: &'a [TreeNode], visit: &mut impl FnMut(&'a TreeNode, usize)) {
    fn walk<'a>(nodes: &'a [TreeNode], depth: usize, visit: &mut impl FnMut(&'a TreeNode, usize)) {
        for node in nodes {
            visit(node, depth);
            walk(&node.children, depth + 1, visit);
        }
    }
    walk(forest, 0, visit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, path: &str) -> TreeNode {
        TreeNode {
            id: id.into(),
            path: path.into(),
            children: vec![],
            is_orphan: false,
            property_hint: None,
            kind: None,
            label: None,
            resource_ref: String::new(),
        }
    }

    #[test]
    fn empty_target_is_treated_as_none() {
        let entry = PresenceEntry::new("alice", Some(""), "#E53935", Utc::now());
        assert_eq!(entry.target(), None);
    }

    #[test]
    fn display_name_falls_back_to_subject_id() {
        let bare = PresenceEntry::new("anon:Ana", None, "#E53935", Utc::now());
        assert_eq!(bare.display_name(), "anon:Ana");

        let named = bare.clone().with_display_name("Ana");
        assert_eq!(named.display_name(), "Ana");
        assert_eq!(named.subject_id, "anon:Ana");

        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("displayName").is_none());
        assert_eq!(serde_json::to_value(&named).unwrap()["displayName"], "Ana");
    }

    #[test]
    fn sort_key_falls_back_to_id() {
        assert_eq!(leaf("abc", "").sort_key(), "abc");
        assert_eq!(leaf("abc", "/page").sort_key(), "/page");
    }

    #[test]
    fn walk_visits_in_preorder_with_depth() {
        let mut root = leaf("root", "/a");
        root.children.push(leaf("child", "/a/b"));
        let forest = vec![root, leaf("other", "/z")];

        let mut seen = Vec::new();
        walk_forest(&forest, &mut |node, depth| seen.push((node.id.clone(), depth)));

        assert_eq!(
            seen,
            vec![("root".to_string(), 0), ("child".to_string(), 1), ("other".to_string(), 0)]
        );
        assert!(find_in_forest(&forest, "child").is_some());
        assert!(find_in_forest(&forest, "missing").is_none());
    }

    #[test]
    fn element_serializes_type_field() {
        let element = Element::new("p", "/page").with_kind("container");
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "container");
        assert_eq!(value["resourceRef"], "/page");
    }
}
