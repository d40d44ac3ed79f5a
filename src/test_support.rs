//! Backends shared by unit tests.

use crate::capability::{NativeBackend, NativeError};

/// Backend that malfunctions on every call except `add`
pub struct FailingBackend;

impl NativeBackend for FailingBackend {
    fn hello(&self) -> Result<String, NativeError> {
        panic!("native hello crashed");
    }

    fn add(&self, a: f64, b: f64) -> Result<f64, NativeError> {
        Ok(a + b)
    }

    fn load_config(&self) -> Result<String, NativeError> {
        Err(NativeError::Backend("store offline".into()))
    }

    fn save_config(&self, _json: &str) -> Result<bool, NativeError> {
        Err(NativeError::Backend("store offline".into()))
    }

    fn get_config_path(&self) -> Result<String, NativeError> {
        Err(NativeError::NullResult("getConfigPath"))
    }
}
