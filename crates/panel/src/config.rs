// Panel configuration at `~/.pagepresence/panel.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pagepresence_common::presence::highlight::HIGHLIGHT_MS;
use pagepresence_common::view::label::DEFAULT_SHORT_ID_LEN;

/// Root directory for PagePresence state: `~/.pagepresence/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pagepresence"))
}

/// Path to the panel config file: `~/.pagepresence/panel.toml`.
pub fn panel_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("panel.toml"))
}

/// Which panel view is shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    List,
    Map,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PanelConfig {
    /// Interval between heartbeats carrying the current target element.
    pub heartbeat_interval_ms: u64,
    /// Poll interval used when push delivery is unavailable.
    pub poll_interval_ms: u64,
    /// How long changed subjects stay highlighted.
    pub highlight_ms: u64,
    /// How long the "Live" badge stays on after a snapshot.
    pub live_indicator_grace_ms: u64,
    /// Presence rows older than this are evicted.
    pub stale_after_secs: u64,
    /// Characters of an id shown in fallback labels.
    pub short_id_len: usize,
    pub default_view: ViewMode,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 8_000,
            poll_interval_ms: 3_000,
            highlight_ms: HIGHLIGHT_MS,
            live_indicator_grace_ms: 5_000,
            stale_after_secs: 120,
            short_id_len: DEFAULT_SHORT_ID_LEN,
            default_view: ViewMode::List,
        }
    }
}

impl PanelConfig {
    /// Load from `~/.pagepresence/panel.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        panel_config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn live_indicator_grace(&self) -> Duration {
        Duration::from_millis(self.live_indicator_grace_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_panel_timings() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(8));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.highlight_duration(), Duration::from_millis(1200));
        assert_eq!(cfg.live_indicator_grace(), Duration::from_secs(5));
        assert_eq!(cfg.stale_after(), Duration::from_secs(120));
        assert_eq!(cfg.short_id_len, 8);
        assert_eq!(cfg.default_view, ViewMode::List);
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("panel.toml");

        let cfg = PanelConfig {
            poll_interval_ms: 1_000,
            default_view: ViewMode::Map,
            ..PanelConfig::default()
        };
        cfg.save_to(&path).unwrap();

        assert_eq!(PanelConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg: PanelConfig = toml::from_str("highlight_ms = 400\ndefault_view = \"map\"\n").unwrap();
        assert_eq!(cfg.highlight_ms, 400);
        assert_eq!(cfg.default_view, ViewMode::Map);
        assert_eq!(cfg.poll_interval_ms, 3_000);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let error = PanelConfig::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(&path, "poll_interval_ms = \"soon\"").unwrap();
        assert!(matches!(PanelConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn config_dir_is_under_home() {
        let path = panel_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with(".pagepresence/panel.toml"));
    }
}
