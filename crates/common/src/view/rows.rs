// Row models for the two panel views: the block map and the flat list.

use serde::{Deserialize, Serialize};

use super::label::{icon_for, label_for_node, short_id, BlockIcon};
use super::state::ViewState;
use crate::presence::highlight::HighlightSet;
use crate::presence::index::PresenceIndex;
use crate::types::{PresenceEntry, TreeNode};

pub const EMPTY_MAP_TEXT: &str = "No blocks available. Select a page in the editor.";
pub const EMPTY_LIST_TEXT: &str = "No other viewers on this page.";

/// A subject marker drawn next to a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMarker {
    pub subject_id: String,
    pub display_name: String,
    pub color: String,
}

/// One visible row of the block map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapRow {
    pub id: String,
    pub depth: usize,
    pub label: String,
    pub icon: BlockIcon,
    pub is_orphan: bool,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
    pub highlighted: bool,
    #[serde(default)]
    pub users: Vec<UserMarker>,
}

/// One row of the flat presence list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRow {
    pub subject_id: String,
    pub display_name: String,
    pub color: String,
    pub highlighted: bool,
    #[serde(default)]
    pub target_element_id: Option<String>,
    /// `editing <short id>…` when the subject has a target.
    #[serde(default)]
    pub editing: Option<String>,
}

/// Flatten the visible part of the forest, descending only into expanded
/// nodes.
pub fn map_rows(
    forest: &[TreeNode],
    index: &PresenceIndex,
    highlighted: &HighlightSet,
    view: &ViewState,
    short_id_len: usize,
) -> Vec<MapRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let users = index.on_element(&node.id);
        let expanded = view.is_expanded(&node.id);

        rows.push(MapRow {
            id: node.id.clone(),
            depth,
            label: label_for_node(node, short_id_len),
            icon: icon_for(node),
            is_orphan: node.is_orphan,
            has_children: node.has_children(),
            expanded,
            selected: view.is_selected(&node.id),
            highlighted: users.iter().any(|user| highlighted.contains(&user.subject_id)),
            users: users
                .iter()
                .map(|user| UserMarker {
                    subject_id: user.subject_id.clone(),
                    display_name: user.display_name().to_string(),
                    color: user.color.clone(),
                })
                .collect(),
        });

        if expanded {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    rows
}

pub fn list_rows(
    presence: &[PresenceEntry],
    highlighted: &HighlightSet,
    short_id_len: usize,
) -> Vec<ListRow> {
    presence
        .iter()
        .map(|entry| ListRow {
            subject_id: entry.subject_id.clone(),
            display_name: entry.display_name().to_string(),
            color: entry.color.clone(),
            highlighted: highlighted.contains(&entry.subject_id),
            target_element_id: entry.target().map(str::to_string),
            editing: entry.target().map(|target| format!("editing {}…", short_id(target, short_id_len))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tree::build_forest;
    use crate::types::Element;

    fn entry(subject: &str, target: Option<&str>) -> PresenceEntry {
        PresenceEntry::new(subject, target, "#00897B", Utc::now())
    }

    fn fixture() -> (Vec<TreeNode>, Vec<PresenceEntry>) {
        let elements = vec![
            Element::new("page", "/page").with_label("Page"),
            Element::new("card", "/page/card").with_label("Card"),
            Element::new("footer", "/page/footer").with_label("Footer"),
        ];
        let presence = vec![entry("alice", Some("card")), entry("bob", Some("card_title"))];
        (build_forest(&elements, &presence), presence)
    }

    #[test]
    fn expanded_forest_renders_depth_first() {
        let (forest, presence) = fixture();
        let index = PresenceIndex::build(&presence);
        let view = ViewState::default().observe_forest(&forest);

        let rows = map_rows(&forest, &index, &HighlightSet::new(), &view, 8);

        let shape: Vec<(&str, usize)> = rows.iter().map(|row| (row.id.as_str(), row.depth)).collect();
        assert_eq!(shape, vec![("page", 0), ("card", 1), ("card_title", 2), ("footer", 1)]);
        assert_eq!(rows[1].users.len(), 1);
        assert_eq!(rows[1].users[0].subject_id, "alice");
        assert_eq!(rows[2].label, "title");
        assert!(rows[2].is_orphan);
    }

    #[test]
    fn collapsed_node_hides_children() {
        let (forest, presence) = fixture();
        let index = PresenceIndex::build(&presence);
        let view = ViewState::default();

        let rows = map_rows(&forest, &index, &HighlightSet::new(), &view, 8);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].has_children);
        assert!(!rows[0].expanded);
    }

    #[test]
    fn highlight_and_selection_flags() {
        let (forest, presence) = fixture();
        let index = PresenceIndex::build(&presence);
        let view = ViewState::default()
            .observe_forest(&forest)
            .apply(super::super::state::ViewEvent::Select("footer"));
        let highlighted: HighlightSet = ["alice".to_string()].into_iter().collect();

        let rows = map_rows(&forest, &index, &highlighted, &view, 8);

        let card = rows.iter().find(|row| row.id == "card").unwrap();
        assert!(card.highlighted);
        let footer = rows.iter().find(|row| row.id == "footer").unwrap();
        assert!(footer.selected);
        assert!(!footer.highlighted);
    }

    #[test]
    fn list_rows_follow_snapshot_order() {
        let presence = vec![entry("bob", Some("0123456789abc")), entry("alice", None)];
        let highlighted: HighlightSet = ["alice".to_string()].into_iter().collect();

        let rows = list_rows(&presence, &highlighted, 8);

        assert_eq!(rows[0].subject_id, "bob");
        assert_eq!(rows[0].editing.as_deref(), Some("editing 01234567…"));
        assert!(!rows[0].highlighted);
        assert_eq!(rows[1].editing, None);
        assert!(rows[1].highlighted);
    }

    #[test]
    fn rows_show_display_name_but_highlight_by_subject() {
        let presence = vec![
            entry("sub-1", Some("card")).with_display_name("Ana"),
            entry("sub-2", Some("card")).with_display_name("Ana"),
        ];
        let highlighted: HighlightSet = ["sub-2".to_string()].into_iter().collect();

        let list = list_rows(&presence, &highlighted, 8);
        assert_eq!(list[0].display_name, "Ana");
        assert!(!list[0].highlighted);
        assert!(list[1].highlighted);

        let forest = build_forest(&[Element::new("card", "/card")], &presence);
        let index = PresenceIndex::build(&presence);
        let map = map_rows(&forest, &index, &highlighted, &ViewState::default(), 8);
        let markers: Vec<(&str, &str)> =
            map[0].users.iter().map(|u| (u.subject_id.as_str(), u.display_name.as_str())).collect();
        assert_eq!(markers, vec![("sub-1", "Ana"), ("sub-2", "Ana")]);
        assert!(map[0].highlighted);
    }
}
