//! Config persistence protocol.
//!
//! Three operations ride on the gateway: load, save and resolve-path. The
//! document is opaque text to the bridge; the native store owns parsing,
//! validation and consistency under concurrent saves.

use crate::capability::{NativeBackend, NativeCapability, NativeError};
use serde::{Deserialize, Serialize};

/// Document returned when nothing is stored or no backend is loaded
pub const EMPTY_DOCUMENT: &str = "{}";

/// Path reported when no backend is loaded
pub const UNKNOWN_PATH: &str = "unknown";

/// A config document and where it lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Serialized document text, uninterpreted
    pub text: String,
    /// Resolved location, opaque
    pub location: String,
}

impl ConfigDocument {
    /// Document reported without a backend
    pub fn absent() -> Self {
        Self {
            text: EMPTY_DOCUMENT.to_string(),
            location: UNKNOWN_PATH.to_string(),
        }
    }
}

/// Read the stored document from a live backend
pub fn load(backend: &dyn NativeBackend) -> Result<String, NativeError> {
    backend.load_config()
}

/// Persist `text` verbatim through a live backend
pub fn save(backend: &dyn NativeBackend, text: &str) -> Result<bool, NativeError> {
    backend.save_config(text)
}

/// Resolve the document location through a live backend
pub fn resolve_path(backend: &dyn NativeBackend) -> Result<String, NativeError> {
    backend.get_config_path()
}

/// Read document and location together, falling back when absent
pub fn snapshot(capability: &NativeCapability) -> Result<ConfigDocument, NativeError> {
    match capability {
        NativeCapability::Loaded(backend) => Ok(ConfigDocument {
            text: load(backend.as_ref())?,
            location: resolve_path(backend.as_ref())?,
        }),
        NativeCapability::Unavailable(_) => Ok(ConfigDocument::absent()),
    }
}
