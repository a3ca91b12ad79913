// Where command results go and in which shape.
//
// A terminal gets text; a pipe or `--json` gets one JSON document per
// command. Failures follow the same split on stderr.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// `--json` wins; otherwise text only when stdout is a terminal.
    pub fn detect(json_flag: bool) -> Self {
        Self::choose(json_flag, io::stdout().is_terminal())
    }

    fn choose(json_flag: bool, stdout_is_tty: bool) -> Self {
        match (json_flag, stdout_is_tty) {
            (false, true) => Self::Text,
            _ => Self::Json,
        }
    }
}

pub fn print_output<T, F>(format: OutputFormat, result: &T, as_text: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    render_to(&mut io::stdout().lock(), format, result, as_text)
}

/// Render a command result. `as_text` runs only for text output.
pub fn render_to<W, T, F>(out: &mut W, format: OutputFormat, result: &T, as_text: F) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if format == OutputFormat::Text {
        return writeln!(out, "{}", as_text(result));
    }
    serde_json::to_writer(&mut *out, result).map_err(io::Error::other)?;
    writeln!(out)
}

/// Report a failed command on stderr. Write errors are dropped since
/// stderr is the last place to report them.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let stderr = io::stderr();
    let colored = stderr.is_terminal();
    let _ = report_to(&mut stderr.lock(), format, error, colored);
}

fn report_to<W: Write>(
    out: &mut W,
    format: OutputFormat,
    error: &anyhow::Error,
    colored: bool,
) -> io::Result<()> {
    let message = format!("{error:#}");
    match format {
        OutputFormat::Text if colored => writeln!(out, "\x1b[31merror:\x1b[0m {message}"),
        OutputFormat::Text => writeln!(out, "error: {message}"),
        OutputFormat::Json => {
            let body = serde_json::json!({ "error": { "code": failure_code(error), "message": message } });
            serde_json::to_writer(&mut *out, &body).map_err(io::Error::other)?;
            writeln!(out)
        }
    }
}

/// Stable code for the first recognizable cause in the chain.
fn failure_code(error: &anyhow::Error) -> &'static str {
    error
        .chain()
        .find_map(|cause| {
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                Some(match io_error.kind() {
                    io::ErrorKind::NotFound => "FILE_NOT_FOUND",
                    io::ErrorKind::PermissionDenied => "PERMISSION_DENIED",
                    _ => "IO_ERROR",
                })
            } else {
                cause.downcast_ref::<serde_json::Error>().map(|_| "INVALID_INPUT")
            }
        })
        .unwrap_or("ERROR")
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    fn missing_file() -> anyhow::Error {
        Err::<(), _>(io::Error::from(io::ErrorKind::NotFound))
            .context("failed to read presence from snap.json")
            .unwrap_err()
    }

    #[test]
    fn format_prefers_text_only_on_a_terminal() {
        assert_eq!(OutputFormat::choose(false, true), OutputFormat::Text);
        assert_eq!(OutputFormat::choose(false, false), OutputFormat::Json);
        assert_eq!(OutputFormat::choose(true, true), OutputFormat::Json);
        assert_eq!(OutputFormat::detect(true), OutputFormat::Json);
    }

    #[test]
    fn text_result_uses_renderer() {
        let mut out = Vec::new();
        render_to(&mut out, OutputFormat::Text, &["ana", "ben"], |names| names.join(", ")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ana, ben\n");
    }

    #[test]
    fn json_result_skips_renderer() {
        let mut out = Vec::new();
        render_to(&mut out, OutputFormat::Json, &serde_json::json!({ "changed": ["ana"] }), |_| {
            panic!("text renderer used for JSON output")
        })
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"changed\":[\"ana\"]}\n");
    }

    #[test]
    fn text_failure_is_colored_only_when_asked() {
        let mut plain = Vec::new();
        report_to(&mut plain, OutputFormat::Text, &anyhow::anyhow!("boom"), false).unwrap();
        assert_eq!(String::from_utf8(plain).unwrap(), "error: boom\n");

        let mut colored = Vec::new();
        report_to(&mut colored, OutputFormat::Text, &anyhow::anyhow!("boom"), true).unwrap();
        assert!(String::from_utf8(colored).unwrap().starts_with("\x1b[31merror:"));
    }

    #[test]
    fn json_failure_carries_code_and_context() {
        let mut out = Vec::new();
        report_to(&mut out, OutputFormat::Json, &missing_file(), false).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["error"]["code"], "FILE_NOT_FOUND");
        assert!(value["error"]["message"].as_str().unwrap().contains("snap.json"));
    }

    #[test]
    fn failure_code_follows_cause_chain() {
        assert_eq!(failure_code(&missing_file()), "FILE_NOT_FOUND");

        let invalid = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(failure_code(&anyhow::Error::new(invalid).context("parsing elements.json")), "INVALID_INPUT");

        assert_eq!(failure_code(&anyhow::anyhow!("other")), "ERROR");
    }
}
