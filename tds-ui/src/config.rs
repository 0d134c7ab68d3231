//! UI configuration: an optional TOML file with CLI overrides on top.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for the terminal wizard.
///
/// ```toml
/// api_url = "http://127.0.0.1:8000"
/// export_dir = "reports"
/// log_file = "tds-ui.log"
/// log_level = "debug"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    pub api_url: String,
    /// Where downloaded reports are written.
    pub export_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub timeout_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            export_dir: PathBuf::from("."),
            log_file: None,
            log_level: None,
            timeout_secs: 30,
        }
    }
}

/// Values given on the command line. `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl UiConfig {
    pub fn from_toml(
        path: &Path,
        text: &str,
    ) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Loads `path` when given, otherwise starts from the defaults.
    pub fn resolve(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    pub fn with_overrides(
        mut self,
        overrides: ConfigOverrides,
    ) -> Self {
        if let Some(api_url) = overrides.api_url {
            self.api_url = api_url;
        }
        if let Some(export_dir) = overrides.export_dir {
            self.export_dir = export_dir;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
