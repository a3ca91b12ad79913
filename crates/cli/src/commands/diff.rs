// `pagepresence diff`: subjects that joined or moved between two snapshots.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use pagepresence_common::presence::highlight::changed_subjects;
use pagepresence_common::types::PresenceEntry;

use super::load_presence;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Earlier presence snapshot.
    #[arg(long)]
    pub previous: PathBuf,

    /// Later presence snapshot.
    #[arg(long)]
    pub current: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    pub changed: Vec<String>,
}

pub fn run(args: DiffArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = load_presence(&args.previous).and_then(|previous| {
        let current = load_presence(&args.current)?;
        Ok(diff(&previous, &current))
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

fn diff(previous: &[PresenceEntry], current: &[PresenceEntry]) -> DiffResult {
    DiffResult { changed: changed_subjects(previous, current).into_iter().collect() }
}

fn format_human(result: &DiffResult) -> String {
    if result.changed.is_empty() {
        return "No presence changes.".into();
    }
    result.changed.iter().map(|subject| format!("* {subject}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(subject: &str, target: Option<&str>) -> PresenceEntry {
        PresenceEntry::new(subject, target, "#C0CA33", Utc::now())
    }

    #[test]
    fn moved_and_joined_subjects_are_listed_sorted() {
        let previous = vec![entry("zoe", Some("a")), entry("ana", Some("a")), entry("gone", None)];
        let current = vec![entry("zoe", Some("b")), entry("ana", Some("a")), entry("ben", None)];

        let result = diff(&previous, &current);

        assert_eq!(result.changed, vec!["ben".to_string(), "zoe".to_string()]);
        assert_eq!(format_human(&result), "* ben\n* zoe");
    }

    #[test]
    fn identical_snapshots_report_no_changes() {
        let snapshot = vec![entry("ana", None)];
        let result = diff(&snapshot, &snapshot);
        assert!(result.changed.is_empty());
        assert_eq!(format_human(&result), "No presence changes.");
    }
}
