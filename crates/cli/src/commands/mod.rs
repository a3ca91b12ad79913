// CLI subcommand dispatch and shared input loading.

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use tracing::debug;

use pagepresence_common::presence::highlight::{changed_subjects, HighlightSet};
use pagepresence_common::protocol::records::{parse_elements, parse_presence};
use pagepresence_common::types::{Element, PresenceEntry};

pub mod diff;
pub mod list;
pub mod map;

#[derive(Subcommand)]
pub enum Command {
    /// Render the block map with presence markers
    Map(map::MapArgs),
    /// Render the flat presence list
    List(list::ListArgs),
    /// Show subjects that joined or moved between two snapshots
    Diff(diff::DiffArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Map(args) => map::run(args),
        Command::List(args) => list::run(args),
        Command::Diff(args) => diff::run(args),
    }
}

pub(crate) fn load_elements(path: &Path) -> anyhow::Result<Vec<Element>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read elements from {}", path.display()))?;
    let elements =
        parse_elements(&json).with_context(|| format!("invalid elements in {}", path.display()))?;
    debug!(path = %path.display(), count = elements.len(), "loaded elements");
    Ok(elements)
}

pub(crate) fn load_presence(path: &Path) -> anyhow::Result<Vec<PresenceEntry>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read presence from {}", path.display()))?;
    let entries = parse_presence(&json)
        .with_context(|| format!("invalid presence snapshot in {}", path.display()))?;
    debug!(path = %path.display(), count = entries.len(), "loaded presence snapshot");
    Ok(entries)
}

/// Highlight set for `current`, relative to an optional earlier snapshot.
/// Without one nothing is highlighted.
pub(crate) fn highlight_against(
    previous: Option<&Path>,
    current: &[PresenceEntry],
) -> anyhow::Result<HighlightSet> {
    match previous {
        Some(path) => Ok(changed_subjects(&load_presence(path)?, current)),
        None => Ok(HighlightSet::new()),
    }
}
