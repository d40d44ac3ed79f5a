//! Native capability acquisition.
//!
//! The native backend is an optional build artifact. It is loaded exactly
//! once at startup and the outcome is frozen into a [`NativeCapability`]
//! that the gateway matches on for every call. Absence is a supported
//! configuration, not an error.

pub mod dylib;

use crate::config::NativeModuleSource;
use crate::native::BuiltinBackend;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub use dylib::DylibBackend;

/// Command suggested to operators when the native module is missing
pub const BUILD_HINT: &str = "cargo build --release";

/// Methods every native backend exposes
///
/// Calls are synchronous; the gateway runs them on the blocking pool.
/// An `Err` is a live malfunction and is propagated to the caller as a
/// rejection, never replaced by a fallback.
pub trait NativeBackend: Send + Sync {
    /// Greeting from the native side
    fn hello(&self) -> Result<String, NativeError>;

    /// Add two numbers
    fn add(&self, a: f64, b: f64) -> Result<f64, NativeError>;

    /// Read the persisted config document
    fn load_config(&self) -> Result<String, NativeError>;

    /// Persist a config document, reporting success
    fn save_config(&self, json: &str) -> Result<bool, NativeError>;

    /// Location of the config document
    fn get_config_path(&self) -> Result<String, NativeError>;
}

/// Failure inside a loaded native backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NativeError {
    /// The backend returned no value where one was required
    #[error("native call '{0}' returned no value")]
    NullResult(&'static str),

    /// The backend returned bytes that are not valid UTF-8
    #[error("native call '{0}' returned invalid UTF-8")]
    InvalidUtf8(&'static str),

    /// The backend reported its own failure
    #[error("{0}")]
    Backend(String),
}

/// Reasons a native module could not be acquired
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The module was deliberately not configured
    #[error("native module disabled by configuration")]
    Disabled,

    /// The shared library file does not exist
    #[error("native module not found at {0}")]
    NotFound(String),

    /// The dynamic loader refused the library
    #[error("failed to load native module: {0}")]
    Library(#[from] libloading::Error),

    /// The library does not export a required symbol
    #[error("native module is missing symbol '{0}'")]
    MissingSymbol(String),
}

/// Something that can attempt to produce a native backend
pub trait CapabilityLoader {
    /// Human-readable source description used in diagnostics
    fn describe(&self) -> String;

    /// Attempt to load the backend
    fn load(&self) -> Result<Arc<dyn NativeBackend>, LoadError>;
}

impl<F> CapabilityLoader for F
where
    F: Fn() -> Result<Arc<dyn NativeBackend>, LoadError>,
{
    fn describe(&self) -> String {
        "custom loader".to_string()
    }

    fn load(&self) -> Result<Arc<dyn NativeBackend>, LoadError> {
        self()
    }
}

/// Loader selected from [`NativeModuleSource`]
pub struct SourceLoader {
    source: NativeModuleSource,
    app_name: String,
}

impl SourceLoader {
    /// Create a loader for the given source
    pub fn new(source: NativeModuleSource, app_name: impl Into<String>) -> Self {
        Self {
            source,
            app_name: app_name.into(),
        }
    }
}

impl CapabilityLoader for SourceLoader {
    fn describe(&self) -> String {
        match &self.source {
            NativeModuleSource::Builtin => "builtin backend".to_string(),
            NativeModuleSource::Disabled => "disabled".to_string(),
            NativeModuleSource::Library(path) => path.display().to_string(),
        }
    }

    fn load(&self) -> Result<Arc<dyn NativeBackend>, LoadError> {
        match &self.source {
            NativeModuleSource::Builtin => Ok(Arc::new(BuiltinBackend::new(&self.app_name))),
            NativeModuleSource::Disabled => Err(LoadError::Disabled),
            NativeModuleSource::Library(path) => Ok(Arc::new(DylibBackend::open(path)?)),
        }
    }
}

/// Outcome of the one-time native module load
#[derive(Clone)]
pub enum NativeCapability {
    /// The backend is live
    Loaded(Arc<dyn NativeBackend>),
    /// The backend is absent, with the diagnostic reason
    Unavailable(String),
}

impl NativeCapability {
    /// Whether a live backend is present
    pub fn is_loaded(&self) -> bool {
        matches!(self, NativeCapability::Loaded(_))
    }

    /// The absence reason, if any
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            NativeCapability::Loaded(_) => None,
            NativeCapability::Unavailable(reason) => Some(reason),
        }
    }
}

impl fmt::Debug for NativeCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeCapability::Loaded(_) => f.write_str("Loaded(..)"),
            NativeCapability::Unavailable(reason) => {
                f.debug_tuple("Unavailable").field(reason).finish()
            }
        }
    }
}

/// Attempt to acquire the native capability
///
/// Never fails: every load error becomes `Unavailable(reason)`. The outcome
/// is logged once here and nowhere else.
pub fn acquire(loader: &dyn CapabilityLoader) -> NativeCapability {
    let source = loader.describe();

    match loader.load() {
        Ok(backend) => {
            info!(source = %source, "Native backend loaded successfully");
            NativeCapability::Loaded(backend)
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(source = %source, reason = %reason, "Native backend not available");
            warn!("Run \"{}\" to build the native module", BUILD_HINT);
            NativeCapability::Unavailable(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl NativeBackend for Fixed {
        fn hello(&self) -> Result<String, NativeError> {
            Ok("fixed".into())
        }
        fn add(&self, a: f64, b: f64) -> Result<f64, NativeError> {
            Ok(a + b)
        }
        fn load_config(&self) -> Result<String, NativeError> {
            Ok("{}".into())
        }
        fn save_config(&self, _json: &str) -> Result<bool, NativeError> {
            Ok(true)
        }
        fn get_config_path(&self) -> Result<String, NativeError> {
            Ok("/tmp/config.json".into())
        }
    }

    #[test]
    fn test_acquire_success() {
        let loader = || -> Result<Arc<dyn NativeBackend>, LoadError> { Ok(Arc::new(Fixed)) };
        let capability = acquire(&loader);
        assert!(capability.is_loaded());
        assert!(capability.unavailable_reason().is_none());
    }

    #[test]
    fn test_acquire_failure_is_unavailable() {
        let loader = || -> Result<Arc<dyn NativeBackend>, LoadError> {
            Err(LoadError::NotFound("/nowhere/libshell_bridge.so".into()))
        };
        let capability = acquire(&loader);
        assert!(!capability.is_loaded());
        assert!(capability
            .unavailable_reason()
            .unwrap()
            .contains("/nowhere/libshell_bridge.so"));
    }

    #[test]
    fn test_disabled_source() {
        let capability = acquire(&SourceLoader::new(NativeModuleSource::Disabled, "app"));
        assert_eq!(
            capability.unavailable_reason(),
            Some("native module disabled by configuration")
        );
    }

    #[test]
    fn test_missing_library_source() {
        let loader = SourceLoader::new(
            NativeModuleSource::Library("/definitely/not/here.so".into()),
            "app",
        );
        let capability = acquire(&loader);
        assert!(!capability.is_loaded());
    }

    #[test]
    fn test_builtin_source() {
        let capability = acquire(&SourceLoader::new(NativeModuleSource::Builtin, "app"));
        assert!(capability.is_loaded());
    }

    #[test]
    fn test_debug_hides_handle() {
        let loaded = NativeCapability::Loaded(Arc::new(Fixed));
        assert_eq!(format!("{:?}", loaded), "Loaded(..)");
    }
}
