// `pagepresence map`: render the block map with presence markers.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use pagepresence_common::presence::highlight::HighlightSet;
use pagepresence_common::presence::index::PresenceIndex;
use pagepresence_common::tree::build_forest;
use pagepresence_common::types::{Element, PresenceEntry};
use pagepresence_common::view::rows::{map_rows, MapRow, EMPTY_MAP_TEXT};
use pagepresence_common::view::state::ViewState;
use pagepresence_panel::config::PanelConfig;

use super::{highlight_against, load_elements, load_presence};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Element records reported by the editor (JSON array).
    #[arg(long)]
    pub elements: PathBuf,

    /// Presence snapshot (JSON array or `{"items": [...]}`).
    #[arg(long)]
    pub presence: PathBuf,

    /// Earlier snapshot; subjects that joined or moved since are highlighted.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Do not auto-expand the tree.
    #[arg(long)]
    pub collapsed: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapResult {
    pub rows: Vec<MapRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn run(args: MapArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    match build(&args) {
        Ok(result) => {
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(e) => {
            output::print_anyhow_error(format, &e);
            Err(e)
        }
    }
}

fn build(args: &MapArgs) -> anyhow::Result<MapResult> {
    let elements = load_elements(&args.elements)?;
    let presence = load_presence(&args.presence)?;
    let highlight = highlight_against(args.previous.as_deref(), &presence)?;
    let short_id_len = PanelConfig::load().short_id_len;
    Ok(render_map(&elements, &presence, &highlight, !args.collapsed, short_id_len))
}

fn render_map(
    elements: &[Element],
    presence: &[PresenceEntry],
    highlight: &HighlightSet,
    expand: bool,
    short_id_len: usize,
) -> MapResult {
    let forest = build_forest(elements, presence);
    if forest.is_empty() {
        return MapResult { rows: Vec::new(), message: Some(EMPTY_MAP_TEXT.to_string()) };
    }

    let index = PresenceIndex::build(presence);
    let view = if expand {
        ViewState::default().observe_forest(&forest)
    } else {
        ViewState::default()
    };
    MapResult { rows: map_rows(&forest, &index, highlight, &view, short_id_len), message: None }
}

fn format_human(result: &MapResult) -> String {
    if let Some(message) = &result.message {
        return message.clone();
    }
    result.rows.iter().map(render_row).collect::<Vec<_>>().join("\n")
}

fn render_row(row: &MapRow) -> String {
    let indent = "  ".repeat(row.depth);
    let prefix = if row.depth == 0 { "" } else { "├─ " };
    let fold = match (row.has_children, row.expanded) {
        (false, _) => ' ',
        (true, true) => '-',
        (true, false) => '+',
    };
    let mut line = format!("{indent}{prefix}{fold} {} {} [{}]", row.icon.glyph(), row.label, row.id);
    if row.is_orphan {
        line.push_str(" (orphan)");
    }
    for user in &row.users {
        line.push_str(&format!(" @{}", user.display_name));
    }
    if row.highlighted {
        line.push_str(" *");
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(subject: &str, target: Option<&str>) -> PresenceEntry {
        PresenceEntry::new(subject, target, "#3949AB", Utc::now())
    }

    fn elements() -> Vec<Element> {
        vec![
            Element::new("page", "urn:x:/page").with_label("Home"),
            Element::new("card", "urn:x:/page/card").with_kind("text"),
        ]
    }

    #[test]
    fn expanded_map_renders_nested_rows() {
        let presence = vec![entry("ana", Some("card"))];
        let highlight: HighlightSet = ["ana".to_string()].into_iter().collect();

        let result = render_map(&elements(), &presence, &highlight, true, 8);
        let output = format_human(&result);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- "));
        assert!(lines[0].contains("Home [page]"));
        assert!(lines[1].starts_with("  ├─ "));
        assert!(lines[1].contains("text card… [card] @ana *"));
    }

    #[test]
    fn collapsed_map_shows_roots_only() {
        let result = render_map(&elements(), &[], &HighlightSet::new(), false, 8);
        assert_eq!(result.rows.len(), 1);
        assert!(format_human(&result).starts_with("+ "));
    }

    #[test]
    fn orphans_are_marked() {
        let presence = vec![entry("ben", Some("card_title"))];
        let result = render_map(&elements(), &presence, &HighlightSet::new(), true, 8);

        let output = format_human(&result);
        assert!(output.contains("title [card_title] (orphan) @ben"));
    }

    #[test]
    fn empty_forest_prints_message() {
        let result = render_map(&[], &[], &HighlightSet::new(), true, 8);
        assert_eq!(format_human(&result), EMPTY_MAP_TEXT);

        let mut buf = Vec::new();
        output::render_to(&mut buf, OutputFormat::Json, &result, format_human).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["rows"].as_array().unwrap().len(), 0);
        assert_eq!(parsed["message"], EMPTY_MAP_TEXT);
    }
}
