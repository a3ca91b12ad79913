// `pagepresence list`: flat list of who is on the page.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use pagepresence_common::presence::highlight::HighlightSet;
use pagepresence_common::types::PresenceEntry;
use pagepresence_common::view::rows::{list_rows, ListRow, EMPTY_LIST_TEXT};
use pagepresence_panel::config::PanelConfig;

use super::{highlight_against, load_presence};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Presence snapshot (JSON array or `{"items": [...]}`).
    #[arg(long)]
    pub presence: PathBuf,

    /// Earlier snapshot; subjects that joined or moved since are highlighted.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub rows: Vec<ListRow>,
}

pub fn run(args: ListArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = load_presence(&args.presence).and_then(|presence| {
        let highlight = highlight_against(args.previous.as_deref(), &presence)?;
        Ok(render_list(&presence, &highlight, PanelConfig::load().short_id_len))
    });

    match result {
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

fn render_list(presence: &[PresenceEntry], highlight: &HighlightSet, short_id_len: usize) -> ListResult {
    ListResult { rows: list_rows(presence, highlight, short_id_len) }
}

fn format_human(result: &ListResult) -> String {
    if result.rows.is_empty() {
        return EMPTY_LIST_TEXT.to_string();
    }
    result
        .rows
        .iter()
        .map(|row| {
            let marker = if row.highlighted { '*' } else { '●' };
            match &row.editing {
                Some(editing) => format!("{marker} {} ({})  {editing}", row.display_name, row.color),
                None => format!("{marker} {} ({})", row.display_name, row.color),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
