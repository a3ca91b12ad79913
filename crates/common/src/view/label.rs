// Display labels and icon classes for block map nodes.

use serde::{Deserialize, Serialize};

use crate::types::TreeNode;

/// Characters of an id shown in fallback labels.
pub const DEFAULT_SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockIcon {
    Image,
    Text,
    Fragment,
    Folder,
    Edit,
}

impl BlockIcon {
    /// Single-character glyph for terminal rendering.
    pub const fn glyph(self) -> char {
        match self {
            Self::Image => '▣',
            Self::Text => 'T',
            Self::Fragment => '◇',
            Self::Folder => '▸',
            Self::Edit => '✎',
        }
    }
}

/// First `len` characters of an id.
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

pub fn label_for_node(node: &TreeNode, short_id_len: usize) -> String {
    let short = short_id(&node.id, short_id_len);
    if node.is_orphan {
        return match node.property_hint.as_deref() {
            Some(hint) if !hint.is_empty() => hint.to_string(),
            _ => format!("block {short}…"),
        };
    }
    match node.label.as_deref() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => {
            let kind = node.kind.as_deref().filter(|kind| !kind.is_empty()).unwrap_or("block");
            format!("{kind} {short}…")
        }
    }
}

pub fn icon_for(node: &TreeNode) -> BlockIcon {
    if node.is_orphan {
        return BlockIcon::Edit;
    }
    let kind = node.kind.as_deref().unwrap_or_default().to_lowercase();
    let resource = node.resource_ref.to_lowercase();

    if kind.contains("image") || resource.contains("image") {
        BlockIcon::Image
    } else if kind.contains("text") || kind == "string" {
        BlockIcon::Text
    } else if kind.contains("fragment") || resource.contains("fragment") {
        BlockIcon::Fragment
    } else if kind.contains("reference") || kind.contains("container") {
        BlockIcon::Folder
    } else {
        BlockIcon::Edit
    }
}
