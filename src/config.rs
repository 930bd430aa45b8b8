//! Configuration loading and management
//!
//! Handles parsing of `.tasktable.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::{DisplayMode, SortKey, DEFAULT_PAGE_SIZE};
use crate::scroll::{DEFAULT_LOAD_MORE_DELAY, DEFAULT_SCROLL_THRESHOLD};

pub const CONFIG_FILE: &str = ".tasktable.toml";

const MAX_PAGE_SIZE: usize = 500;
const MAX_LOAD_MORE_DELAY_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the task list is read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Table presentation
    #[serde(default)]
    pub view: ViewConfig,
}

/// Task source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON file holding the task list
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

/// View configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per page, and rows appended per scroll load
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Distance from the bottom (rows) that triggers a scroll load
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: usize,

    /// Simulated latency of a scroll load
    #[serde(default = "default_load_more_delay_ms")]
    pub load_more_delay_ms: u64,

    /// Initial sort column
    #[serde(default = "default_sort")]
    pub default_sort: String,

    /// Initial display mode
    #[serde(default = "default_mode")]
    pub default_mode: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_scroll_threshold() -> usize {
    DEFAULT_SCROLL_THRESHOLD
}

fn default_load_more_delay_ms() -> u64 {
    DEFAULT_LOAD_MORE_DELAY.as_millis() as u64
}

fn default_sort() -> String {
    "id".to_string()
}

fn default_mode() -> String {
    "paged".to_string()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            scroll_threshold: default_scroll_threshold(),
            load_more_delay_ms: default_load_more_delay_ms(),
            default_sort: default_sort(),
            default_mode: default_mode(),
        }
    }
}

impl ViewConfig {
    pub fn load_more_delay(&self) -> Duration {
        Duration::from_millis(self.load_more_delay_ms)
    }

    pub fn sort_key(&self) -> crate::error::Result<SortKey> {
        self.default_sort
            .parse()
            .map_err(|_| invalid(format!("view.default_sort: unknown key '{}'", self.default_sort)))
    }

    pub fn display_mode(&self) -> crate::error::Result<DisplayMode> {
        self.default_mode
            .parse()
            .map_err(|_| invalid(format!("view.default_mode: unknown mode '{}'", self.default_mode)))
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.page_size == 0 {
            return Err(invalid("view.page_size must be > 0".to_string()));
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err(invalid(format!(
                "view.page_size must be <= {MAX_PAGE_SIZE}"
            )));
        }
        if self.load_more_delay_ms > MAX_LOAD_MORE_DELAY_MS {
            return Err(invalid(format!(
                "view.load_more_delay_ms must be <= {MAX_LOAD_MORE_DELAY_MS}"
            )));
        }
        self.sort_key()?;
        self.display_mode()?;
        Ok(())
    }
}

fn invalid(message: String) -> crate::error::Error {
    crate::error::Error::InvalidConfig(message)
}

impl Config {
    /// Load configuration from a `.tasktable.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.source.path.as_os_str().is_empty() {
            return Err(invalid("source.path cannot be empty".to_string()));
        }
        self.view.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.source.path, PathBuf::from("tasks.json"));
        assert_eq!(cfg.view.page_size, 10);
        assert_eq!(cfg.view.scroll_threshold, 10);
        assert_eq!(cfg.view.load_more_delay(), Duration::from_millis(1500));
        assert_eq!(cfg.view.load_more_delay(), DEFAULT_LOAD_MORE_DELAY);
        assert_eq!(cfg.view.sort_key().expect("sort"), SortKey::Id);
        assert_eq!(cfg.view.display_mode().expect("mode"), DisplayMode::Paged);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[source]
path = "data/todos.json"

[view]
page_size = 25
scroll_threshold = 3
load_more_delay_ms = 200
default_sort = "done_time"
default_mode = "scrolling"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.source.path, PathBuf::from("data/todos.json"));
        assert_eq!(cfg.view.page_size, 25);
        assert_eq!(cfg.view.scroll_threshold, 3);
        assert_eq!(cfg.view.load_more_delay(), Duration::from_millis(200));
        assert_eq!(cfg.view.sort_key().expect("sort"), SortKey::DoneAt);
        assert_eq!(
            cfg.view.display_mode().expect("mode"),
            DisplayMode::Scrolling
        );
    }

    #[test]
    fn invalid_view_config_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        for content in [
            "[view]\npage_size = 0",
            "[view]\ndefault_sort = \"priority\"",
            "[view]\ndefault_mode = \"grid\"",
            "[view]\nload_more_delay_ms = 90000",
        ] {
            fs::write(&path, content).expect("write config");
            let err = Config::load(&path).expect_err("invalid config");
            match err {
                crate::error::Error::InvalidConfig(_) => {}
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.view.page_size, 10);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("page_size = 10"));
        assert!(written.contains("path = \"tasks.json\""));
    }
}
