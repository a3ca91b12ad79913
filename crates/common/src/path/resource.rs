// Structural paths from element resource references.
//
// `urn:conn:/content/site/page/jcr:content/root` -> `/content/site/page/jcr:content/root`.
// Anything that is not a `urn:<authority>:<payload>` reference is already a
// path (or opaque) and passes through unchanged, URLs included.

use std::sync::OnceLock;

use regex::Regex;

/// Path segment separator.
pub const SEPARATOR: char = '/';

/// The document root; elements at this path never have a parent.
pub const ROOT_PATH: &str = "/";

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^urn:[^:]+:(.+)$")
            .expect("resource reference pattern should compile")
    })
}

/// Extract the structural path from a resource reference.
///
/// Returns the payload of a `urn:<authority>:<payload>` reference, or the
/// input unchanged. Never fails; empty input yields an empty path.
pub fn extract_path(reference: &str) -> &str {
    if reference.is_empty() {
        return "";
    }
    reference_pattern()
        .captures(reference)
        .and_then(|captures| captures.get(1))
        .map(|payload| payload.as_str())
        .unwrap_or(reference)
}

/// Whether a path denotes "no structural position": empty or the root marker.
pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == ROOT_PATH
}

/// Iterate the proper ancestors of a path, nearest first.
///
/// `/a/b/c` yields `/a/b`, then `/a`. The leading-separator root is never
/// yielded.
pub fn ancestors(path: &str) -> Ancestors<'_> {
    Ancestors { rest: path }
}

#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rest.rfind(SEPARATOR) {
            Some(index) if index > 0 => {
                self.rest = &self.rest[..index];
                Some(self.rest)
            }
            _ => {
                self.rest = "";
                None
            }
        }
    }
}

/// Last non-empty segment of a path.
pub fn last_segment(path: &str) -> Option<&str> {
    path.split(SEPARATOR).filter(|segment| !segment.is_empty()).last()
}
