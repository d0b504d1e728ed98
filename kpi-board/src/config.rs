//! Configuration loading.
//!
//! Values are resolved in priority order:
//! 1. Command-line flag (clap also folds in the matching environment variable)
//! 2. TOML config file
//! 3. Compiled default

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::format::{ValueFormatter, DEFAULT_PERCENT_MARKERS};

/// Default endpoint of the sheet exporter
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/exec";

/// Callback name the exporter wraps JSONP responses in
pub const DEFAULT_CALLBACK: &str = "loadDashboardData";

/// Default HTTP request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the per-user config directory and file
const APP_DIR: &str = "kpi-board";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub callback: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sheet_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub percent_markers: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values supplied on the command line (or through their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub config_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub endpoint: String,
    pub callback: String,
    pub timeout: Duration,
    /// Link to the backing spreadsheet, shown in the cards view
    pub sheet_url: Option<String>,
    pub log_file: PathBuf,
    pub percent_markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            callback: DEFAULT_CALLBACK.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sheet_url: None,
            log_file: default_log_file(),
            percent_markers: DEFAULT_PERCENT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Config {
    /// Resolve configuration from overrides, an optional file, and defaults.
    ///
    /// An explicitly requested config file must exist; the per-user default
    /// location is only read when present.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match &overrides.config_path {
            Some(path) => FileConfig::load(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => FileConfig::load(&path)?,
                None => FileConfig::default(),
            },
        };
        Self::merge(overrides, file)
    }

    /// Layer overrides on top of file values on top of defaults
    pub fn merge(overrides: Overrides, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let endpoint = overrides
            .endpoint
            .or(file.endpoint)
            .unwrap_or(defaults.endpoint);
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got {:?}",
                endpoint
            )));
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }

        let callback = file.callback.unwrap_or(defaults.callback);
        if callback.is_empty() || !callback.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Invalid(format!(
                "callback must be a plain identifier, got {:?}",
                callback
            )));
        }

        Ok(Self {
            endpoint,
            callback,
            timeout: Duration::from_secs(timeout_secs),
            sheet_url: file.sheet_url,
            log_file: overrides.log_file.or(file.log_file).unwrap_or(defaults.log_file),
            percent_markers: file.percent_markers.unwrap_or(defaults.percent_markers),
        })
    }

    pub fn formatter(&self) -> ValueFormatter {
        ValueFormatter::new(&self.percent_markers)
    }
}

/// `<config_dir>/kpi-board/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// `<cache_dir>/kpi-board/kpi-board.log`, falling back to the temp dir
fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(std::env::temp_dir)
        .join("kpi-board.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::merge(Overrides::default(), FileConfig::default()).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.callback, DEFAULT_CALLBACK);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.percent_markers, vec!["porcentaje", "tasa", "%", "rate"]);
    }

    #[test]
    fn test_overrides_beat_file_values() {
        let file = FileConfig {
            endpoint: Some("https://file.example/exec".to_string()),
            timeout_secs: Some(10),
            ..Default::default()
        };
        let overrides = Overrides {
            endpoint: Some("https://cli.example/exec".to_string()),
            ..Default::default()
        };
        let config = Config::merge(overrides, file).unwrap();
        assert_eq!(config.endpoint, "https://cli.example/exec");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "https://sheets.example/exec"
sheet_url = "https://docs.example/sheet"
percent_markers = ["ratio", "%"]
"#
        )
        .unwrap();

        let config = Config::resolve(Overrides {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.endpoint, "https://sheets.example/exec");
        assert_eq!(config.sheet_url.as_deref(), Some("https://docs.example/sheet"));
        assert_eq!(config.formatter().markers(), ["ratio".to_string(), "%".to_string()]);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpont = \"https://typo.example\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::resolve(Overrides {
            config_path: Some(PathBuf::from("/nonexistent/kpi-board.toml")),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let bad_url = Overrides {
            endpoint: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(Config::merge(bad_url, FileConfig::default()).is_err());

        let zero_timeout = Overrides {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(Config::merge(zero_timeout, FileConfig::default()).is_err());

        let bad_callback = FileConfig {
            callback: Some("alert(1)".to_string()),
            ..Default::default()
        };
        assert!(Config::merge(Overrides::default(), bad_callback).is_err());
    }
}
