//! Builtin native backend.
//!
//! The same backend is reachable two ways: in-process through
//! [`BuiltinBackend`], or as a shared library through the C ABI in
//! `crate::ffi`.

pub mod compute;
pub mod settings;

use crate::capability::{NativeBackend, NativeError};
use crate::persistence::UNKNOWN_PATH;
use settings::{AppConfig, SettingsStore};
use std::path::PathBuf;
use tracing::warn;

pub use compute::{add, hello, system_info, SystemInfo};

/// Backend compiled into this crate
#[derive(Debug, Clone)]
pub struct BuiltinBackend {
    settings: SettingsStore,
}

impl BuiltinBackend {
    /// Backend storing settings in the platform config directory
    pub fn new(app_name: &str) -> Self {
        Self {
            settings: SettingsStore::for_app(app_name),
        }
    }

    /// Backend storing settings at an explicit path
    pub fn with_settings_path(path: PathBuf) -> Self {
        Self {
            settings: SettingsStore::at(path),
        }
    }

    /// The settings store
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

impl NativeBackend for BuiltinBackend {
    fn hello(&self) -> Result<String, NativeError> {
        Ok(hello())
    }

    fn add(&self, a: f64, b: f64) -> Result<f64, NativeError> {
        Ok(add(a, b))
    }

    fn load_config(&self) -> Result<String, NativeError> {
        match self.settings.load() {
            Ok(json) => Ok(json),
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                serde_json::to_string(&AppConfig::default())
                    .map_err(|e| NativeError::Backend(e.to_string()))
            }
        }
    }

    fn save_config(&self, json: &str) -> Result<bool, NativeError> {
        match self.settings.save(json) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "Failed to save settings");
                Ok(false)
            }
        }
    }

    fn get_config_path(&self) -> Result<String, NativeError> {
        Ok(self
            .settings
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_PATH.to_string()))
    }
}
