//! Settings document store.
//!
//! The document lives in the platform config directory:
//! - Linux: `~/.config/<app>/config.json`
//! - macOS: `~/Library/Application Support/<app>/config.json`
//! - Windows: `%APPDATA%\<app>\config.json`

use crate::persistence::EMPTY_DOCUMENT;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Settings store error types
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not a valid settings object
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No platform config directory could be determined
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name
    #[serde(default)]
    pub username: String,

    /// Dark theme toggle
    #[serde(default)]
    pub dark_mode: bool,

    /// Desktop notifications toggle (default: true)
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Autosave interval in seconds (default: 300)
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u32,

    /// Theme name (default: system)
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            dark_mode: false,
            notifications_enabled: true,
            auto_save_interval: default_auto_save_interval(),
            theme: default_theme(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_auto_save_interval() -> u32 {
    300
}

fn default_theme() -> String {
    "system".to_string()
}

/// File-backed settings store
///
/// Clones share one lock, so concurrent saves never interleave their writes.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    io: Arc<Mutex<()>>,
}

impl SettingsStore {
    /// Store in the platform config directory for `app_name`
    pub fn for_app(app_name: &str) -> Self {
        Self {
            path: dirs::config_dir().map(|dir| dir.join(app_name).join("config.json")),
            io: Arc::default(),
        }
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            io: Arc::default(),
        }
    }

    /// Document location, if one could be resolved
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the stored document
    ///
    /// Returns `"{}"` when nothing is stored, the compact serialization of the
    /// stored settings when they parse, and serialized defaults when the file
    /// is corrupt.
    pub fn load(&self) -> Result<String, SettingsError> {
        let path = self.path.as_ref().ok_or(SettingsError::NoConfigDir)?;
        let _guard = self.io.lock();

        if !path.exists() {
            return Ok(EMPTY_DOCUMENT.to_string());
        }

        let contents = fs::read_to_string(path)?;
        let config = match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Stored settings are invalid, using defaults"
                );
                AppConfig::default()
            }
        };

        Ok(serde_json::to_string(&config)?)
    }

    /// Validate and persist a document, creating the directory if needed
    pub fn save(&self, json: &str) -> Result<(), SettingsError> {
        let path = self.path.as_ref().ok_or(SettingsError::NoConfigDir)?;
        let config: AppConfig = serde_json::from_str(json)?;
        let contents = serde_json::to_string_pretty(&config)?;

        let _guard = self.io.lock();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, contents)?;

        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}
