//! Native backend loaded from a shared library.
//!
//! The library must export the C ABI symbols listed in [`symbols`]. Strings
//! returned by the library are owned by it and handed back through
//! `shell_native_string_free`. This crate's own `cdylib` build exports the
//! same set (see `crate::ffi`).

use super::{LoadError, NativeBackend, NativeError};
use libloading::Library;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exported symbol names, NUL-terminated for `Library::get`
pub mod symbols {
    /// `extern "C" fn() -> *mut c_char`
    pub const HELLO: &[u8] = b"shell_native_hello\0";
    /// `extern "C" fn(f64, f64) -> f64`
    pub const ADD: &[u8] = b"shell_native_add\0";
    /// `extern "C" fn() -> *mut c_char`
    pub const LOAD_CONFIG: &[u8] = b"shell_native_load_config\0";
    /// `extern "C" fn(*const c_char) -> bool`
    pub const SAVE_CONFIG: &[u8] = b"shell_native_save_config\0";
    /// `extern "C" fn() -> *mut c_char`
    pub const GET_CONFIG_PATH: &[u8] = b"shell_native_get_config_path\0";
    /// `extern "C" fn(*mut c_char)`
    pub const STRING_FREE: &[u8] = b"shell_native_string_free\0";
}

type StringFn = unsafe extern "C" fn() -> *mut c_char;
type AddFn = unsafe extern "C" fn(f64, f64) -> f64;
type SaveFn = unsafe extern "C" fn(*const c_char) -> bool;
type FreeFn = unsafe extern "C" fn(*mut c_char);

/// Default library location: next to the running executable
pub fn default_library_path() -> PathBuf {
    let file_name = libloading::library_filename("shell_bridge");
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Backend whose methods call into a loaded shared library
pub struct DylibBackend {
    hello: StringFn,
    add: AddFn,
    load_config: StringFn,
    save_config: SaveFn,
    get_config_path: StringFn,
    string_free: FreeFn,
    // Keeps the function pointers above valid.
    _library: Library,
}

impl DylibBackend {
    /// Load the library and resolve every required symbol up front
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }

        // SAFETY: loading runs the library's initializers; the module is a
        // trusted build artifact of this application.
        let library = unsafe { Library::new(path) }?;

        // SAFETY: the signatures match the exported C ABI documented in
        // `symbols`; the copied pointers live no longer than `library`.
        let backend = unsafe {
            Self {
                hello: resolve::<StringFn>(&library, symbols::HELLO)?,
                add: resolve::<AddFn>(&library, symbols::ADD)?,
                load_config: resolve::<StringFn>(&library, symbols::LOAD_CONFIG)?,
                save_config: resolve::<SaveFn>(&library, symbols::SAVE_CONFIG)?,
                get_config_path: resolve::<StringFn>(&library, symbols::GET_CONFIG_PATH)?,
                string_free: resolve::<FreeFn>(&library, symbols::STRING_FREE)?,
                _library: library,
            }
        };

        debug!(path = %path.display(), "Resolved native symbols");
        Ok(backend)
    }

    fn call_string(&self, call: &'static str, f: StringFn) -> Result<String, NativeError> {
        // SAFETY: `f` was resolved from the live library with this signature.
        let ptr = unsafe { f() };
        if ptr.is_null() {
            return Err(NativeError::NullResult(call));
        }

        // SAFETY: non-null pointers from the library are NUL-terminated
        // strings it allocated; ownership returns via `string_free`.
        let result = unsafe { CStr::from_ptr(ptr) }
            .to_str()
            .map(str::to_owned)
            .map_err(|_| NativeError::InvalidUtf8(call));
        unsafe { (self.string_free)(ptr) };
        result
    }
}

/// Copy a function pointer out of the library
///
/// # Safety
/// `T` must be the exact function type exported under `name`.
unsafe fn resolve<T: Copy>(library: &Library, name: &[u8]) -> Result<T, LoadError> {
    // SAFETY: forwarded to the caller.
    let symbol = unsafe { library.get::<T>(name) }.map_err(|_| {
        let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        LoadError::MissingSymbol(printable.into_owned())
    })?;
    Ok(*symbol)
}

impl NativeBackend for DylibBackend {
    fn hello(&self) -> Result<String, NativeError> {
        self.call_string("hello", self.hello)
    }

    fn add(&self, a: f64, b: f64) -> Result<f64, NativeError> {
        // SAFETY: resolved with this signature; plain value arguments.
        Ok(unsafe { (self.add)(a, b) })
    }

    fn load_config(&self) -> Result<String, NativeError> {
        self.call_string("loadConfig", self.load_config)
    }

    fn save_config(&self, json: &str) -> Result<bool, NativeError> {
        // Interior NUL bytes cannot cross the C ABI.
        let Ok(text) = CString::new(json) else {
            debug!("Settings document contains a NUL byte, not saving");
            return Ok(false);
        };
        // SAFETY: `text` outlives the call and is NUL-terminated.
        Ok(unsafe { (self.save_config)(text.as_ptr()) })
    }

    fn get_config_path(&self) -> Result<String, NativeError> {
        self.call_string("getConfigPath", self.get_config_path)
    }
}
