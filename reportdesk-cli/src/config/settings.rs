//! Settings with builder pattern
//!
//! Loaded from a TOML file with environment overrides; every field has a
//! default so a missing file is fine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_QUOTA_BYTES;

const APP_DIR: &str = "reportdesk";

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub store: StoreSettings,
    /// Custom keyword tables: table name -> field -> keywords
    pub keyword_tables: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// No timeout unless configured
    pub timeout_secs: Option<u64>,
}

/// Report store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Defaults to `<data_dir>/reportdesk/reports.db`
    pub database_path: Option<PathBuf>,
    pub quota_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    /// Create a new builder for Settings
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Load settings: explicit path, else `$REPORTDESK_CONFIG`, else the
    /// user config dir. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os("REPORTDESK_CONFIG")
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        let mut settings = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit.is_some() => {
                anyhow::bail!("Config file does not exist: {}", path.display())
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env();
        Ok(settings)
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("REPORTDESK_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        if let Some(db) = std::env::var_os("REPORTDESK_DB") {
            self.store.database_path = Some(PathBuf::from(db));
        }
    }

    /// Database file to open, falling back to the user data dir
    pub fn database_path(&self) -> PathBuf {
        self.store.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("reports.db")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Builder for Settings
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.api.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.settings.api.timeout_secs = Some(secs);
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.store.database_path = Some(path.into());
        self
    }

    pub fn quota_bytes(mut self, bytes: u64) -> Self {
        self.settings.store.quota_bytes = bytes;
        self
    }

    pub fn keyword_table(mut self, name: &str, rows: BTreeMap<String, Vec<String>>) -> Self {
        self.settings.keyword_tables.insert(name.to_string(), rows);
        self
    }

    /// Build the final settings
    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
