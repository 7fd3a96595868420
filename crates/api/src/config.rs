//! Store configuration via `fieldbook.toml`
//!
//! One small file selects the backend and tunes the realtime bus. A default
//! file can be written on first start; edit it and reopen the store to
//! change settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use fieldbook_core::{Error, Result};
use fieldbook_realtime::BusConfig;
use fieldbook_storage::Namespace;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "fieldbook.toml";

/// Persistence backend selected by `backend = "..."`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local, lost on exit
    Memory,
    /// One JSON file per collection under `data_dir`
    File,
}

/// Store configuration loaded from `fieldbook.toml`.
///
/// # Example
///
/// ```toml
/// store_prefix = "journal"
/// backend = "file"
/// data_dir = "/var/lib/fieldbook"
///
/// [realtime]
/// inactivity_timeout_ms = 300000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldbookConfig {
    /// Prefix of every persistence key (`"<prefix>-<collection>"`).
    #[serde(default = "default_store_prefix")]
    pub store_prefix: String,
    /// Backend: `"memory"` or `"file"`.
    #[serde(default = "default_backend_str")]
    pub backend: String,
    /// Directory for the file backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Event bus settings.
    #[serde(default)]
    pub realtime: BusConfig,
}

fn default_store_prefix() -> String {
    "fieldbook".to_string()
}

fn default_backend_str() -> String {
    "memory".to_string()
}

impl Default for FieldbookConfig {
    fn default() -> Self {
        Self {
            store_prefix: default_store_prefix(),
            backend: default_backend_str(),
            data_dir: None,
            realtime: BusConfig::default(),
        }
    }
}

impl FieldbookConfig {
    /// In-memory config with the given key prefix
    pub fn memory(store_prefix: impl Into<String>) -> Self {
        Self {
            store_prefix: store_prefix.into(),
            ..Self::default()
        }
    }

    /// File-backed config rooted at `data_dir`
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: "file".to_string(),
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Parse the backend string into a `BackendKind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"memory"` or `"file"`.
    pub fn backend_kind(&self) -> Result<BackendKind> {
        match self.backend.as_str() {
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            other => Err(Error::validation(format!(
                "Invalid backend '{}' in {}. Expected \"memory\" or \"file\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a bad prefix, unknown backend, a file backend
    /// without `data_dir`, or invalid realtime settings.
    pub fn validate(&self) -> Result<()> {
        Namespace::new(self.store_prefix.as_str())?;
        if self.backend_kind()? == BackendKind::File && self.data_dir.is_none() {
            return Err(Error::validation("backend = \"file\" requires data_dir"));
        }
        self.realtime.validate()
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Fieldbook store configuration
#
# Prefix of every persistence key: "<store_prefix>-<collection>"
store_prefix = "fieldbook"

# Backend: "memory" (default) or "file"
#   "memory" = process-local, nothing survives a restart
#   "file"   = one JSON file per collection under data_dir
backend = "memory"
# data_dir = "/var/lib/fieldbook"

[realtime]
# Connections without a heartbeat for this long are dropped (5 minutes)
inactivity_timeout_ms = 300000
# Events older than this are purged (7 days)
event_retention_ms = 604800000
# Maximum events deleted per purge
cleanup_batch_size = 100
# Collection holding persisted events
events_collection = "events"
# Background sweep period; 0 disables the sweeper thread
sweep_interval_ms = 60000
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: FieldbookConfig = toml::from_str(&content).map_err(|e| {
            Error::validation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
