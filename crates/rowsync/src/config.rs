//! YAML configuration for the REST adapter and logging.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "ROWSYNC_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Backend location, HTTP timeout, log filter and the REST resource of each
/// section.
///
/// ```yaml
/// base_url: https://reports.example.org/api
/// timeout_secs: 10
/// resources:
///   cm_material_used: CMMaterialUsed
///   rtu_main_cabinet: RTUPMMainCabinet
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowsyncConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Section name -> resource path below `base_url`
    #[serde(default)]
    pub resources: IndexMap<String, String>,
}

impl RowsyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: default_log_filter(),
            resources: IndexMap::new(),
        }
    }

    pub fn with_resource(mut self, section: impl Into<String>, resource: impl Into<String>) -> Self {
        self.resources.insert(section.into(), resource.into());
        self
    }

    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config YAML {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: RowsyncConfig = serde_yaml::from_str(content)?;
        if config.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        Ok(config)
    }

    /// Load the file named by `ROWSYNC_CONFIG`, if the variable is set.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_from_file(&PathBuf::from(path)).map(Some),
            None => Ok(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resource path of `section`; sections without an entry use their own
    /// name.
    pub fn resource_for<'a>(&'a self, section: &'a str) -> &'a str {
        self.resources
            .get(section)
            .map(String::as_str)
            .unwrap_or(section)
    }
}
