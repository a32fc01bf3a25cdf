use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use logtally_analytics::{DEFAULT_DAYS, DEFAULT_TOP_N};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "logtally.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON-lines record file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logtally-data/records.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportsConfig {
    /// Rows in the ranked reports
    pub top_n: usize,
    /// Daily traffic window
    pub days: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            days: DEFAULT_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Seconds between automatic refreshes, 0 to disable
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { refresh_secs: 30 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load `path`, or `logtally.toml` in the working directory when `path`
    /// is None. A missing default file yields defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .with_context(|| format!("Invalid config file {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.reports.top_n, 10);
        assert_eq!(config.reports.days, 30);
        assert_eq!(config.dashboard.refresh_secs, 30);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [store]
            path = "/var/lib/logtally/records.jsonl"

            [reports]
            top_n = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            config.store.path,
            PathBuf::from("/var/lib/logtally/records.jsonl")
        );
        assert_eq!(config.reports.top_n, 5);
        assert_eq!(config.reports.days, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml("[reports]\ntopn = 5\n").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
