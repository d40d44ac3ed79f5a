//! Host configuration types and defaults.
//!
//! This module defines which native module the host tries to load, the
//! channel sizing of the bridge, the debug switch read from the environment
//! and the window options handed to the windowing layer.

use crate::capability::dylib::default_library_path;
use crate::lifecycle::WindowOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default application name (used for the settings directory)
pub const DEFAULT_APP_NAME: &str = "shell-bridge";

/// Default capacity of the request and response channels
pub const DEFAULT_REQUEST_BUFFER: usize = 64;

/// Environment variable that attaches DevTools when set to the debug value
pub const DEFAULT_DEBUG_ENV_VAR: &str = "NODE_ENV";

/// Value of the debug variable that attaches DevTools
pub const DEFAULT_DEBUG_ENV_VALUE: &str = "development";

/// Environment variable selecting the native module
pub const NATIVE_MODULE_ENV_VAR: &str = "SHELL_BRIDGE_NATIVE_MODULE";

/// Where the native backend comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NativeModuleSource {
    /// The backend compiled into this crate
    Builtin,
    /// No backend; every operation answers with its fallback
    Disabled,
    /// A shared library exporting the native C ABI
    Library(PathBuf),
}

impl Default for NativeModuleSource {
    fn default() -> Self {
        NativeModuleSource::Library(default_library_path())
    }
}

impl NativeModuleSource {
    /// Parse the value of [`NATIVE_MODULE_ENV_VAR`]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "builtin" => NativeModuleSource::Builtin,
            "none" | "disabled" | "" => NativeModuleSource::Disabled,
            path => NativeModuleSource::Library(PathBuf::from(path)),
        }
    }
}

/// Configuration for the host process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Application name (default: shell-bridge)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Native module to acquire at startup
    #[serde(default)]
    pub native_module: NativeModuleSource,

    /// Capacity of the request and response channels (default: 64)
    #[serde(default = "default_request_buffer")]
    pub request_buffer: usize,

    /// Variable checked to attach DevTools (default: NODE_ENV)
    #[serde(default = "default_debug_env_var")]
    pub debug_env_var: String,

    /// Value of the variable that attaches DevTools (default: development)
    #[serde(default = "default_debug_env_value")]
    pub debug_env_value: String,

    /// Main window options
    #[serde(default)]
    pub window: WindowOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            native_module: NativeModuleSource::default(),
            request_buffer: DEFAULT_REQUEST_BUFFER,
            debug_env_var: DEFAULT_DEBUG_ENV_VAR.to_string(),
            debug_env_value: DEFAULT_DEBUG_ENV_VALUE.to_string(),
            window: WindowOptions::default(),
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the native module taken from the environment if set
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(NATIVE_MODULE_ENV_VAR) {
            Ok(value) => config.with_native_module(NativeModuleSource::parse(&value)),
            Err(_) => config,
        }
    }

    /// Set the application name
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the native module source
    pub fn with_native_module(mut self, source: NativeModuleSource) -> Self {
        self.native_module = source;
        self
    }

    /// Set the channel capacity
    pub fn with_request_buffer(mut self, buffer: usize) -> Self {
        self.request_buffer = buffer;
        self
    }

    /// Set the debug variable name and the value that enables it
    pub fn with_debug_env(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.debug_env_var = var.into();
        self.debug_env_value = value.into();
        self
    }

    /// Set the window options
    pub fn with_window(mut self, window: WindowOptions) -> Self {
        self.window = window;
        self
    }

    /// Whether DevTools should be attached at startup
    ///
    /// An unset variable means no.
    pub fn devtools_enabled(&self) -> bool {
        std::env::var(&self.debug_env_var)
            .map(|value| value == self.debug_env_value)
            .unwrap_or(false)
    }

    /// Window options with the DevTools flag resolved from the environment
    pub fn resolved_window(&self) -> WindowOptions {
        let mut window = self.window.clone();
        window.open_devtools = self.devtools_enabled();
        window
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app_name".into(),
                reason: "must not be empty".into(),
            });
        }

        if self.request_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_buffer".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.debug_env_var.is_empty() {
            return Err(ConfigError::MissingField {
                field: "debug_env_var".into(),
            });
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window".into(),
                reason: "width and height must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field name
        field: String,
        /// The reason it's invalid
        reason: String,
    },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField {
        /// The field name
        field: String,
    },
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_request_buffer() -> usize {
    DEFAULT_REQUEST_BUFFER
}

fn default_debug_env_var() -> String {
    DEFAULT_DEBUG_ENV_VAR.to_string()
}

fn default_debug_env_value() -> String {
    DEFAULT_DEBUG_ENV_VALUE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.request_buffer, DEFAULT_REQUEST_BUFFER);
        assert_eq!(config.debug_env_var, "NODE_ENV");
        assert!(matches!(config.native_module, NativeModuleSource::Library(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = BridgeConfig::new()
            .with_app_name("demo")
            .with_native_module(NativeModuleSource::Builtin)
            .with_request_buffer(8);

        assert_eq!(config.app_name, "demo");
        assert_eq!(config.native_module, NativeModuleSource::Builtin);
        assert_eq!(config.request_buffer, 8);
    }

    #[test]
    fn test_config_validation() {
        assert!(BridgeConfig::new().with_request_buffer(0).validate().is_err());
        assert!(BridgeConfig::new().with_app_name("  ").validate().is_err());
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_native_source_parse() {
        assert_eq!(NativeModuleSource::parse("builtin"), NativeModuleSource::Builtin);
        assert_eq!(NativeModuleSource::parse("none"), NativeModuleSource::Disabled);
        assert_eq!(
            NativeModuleSource::parse("/opt/app/libshell_bridge.so"),
            NativeModuleSource::Library(PathBuf::from("/opt/app/libshell_bridge.so"))
        );
    }

    #[test]
    fn test_devtools_unset_variable() {
        let config = BridgeConfig::new().with_debug_env("SHELL_BRIDGE_TEST_UNSET_DEBUG_VAR", "1");
        assert!(!config.devtools_enabled());
        assert!(!config.resolved_window().open_devtools);
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"appName":"demo","nativeModule":"disabled"}"#).unwrap();
        assert_eq!(config.app_name, "demo");
        assert_eq!(config.native_module, NativeModuleSource::Disabled);
        assert_eq!(config.request_buffer, DEFAULT_REQUEST_BUFFER);
        assert_eq!(config.window.width, 900);
    }
}
