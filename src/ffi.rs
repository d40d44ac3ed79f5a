//! C ABI exports of the builtin backend.
//!
//! Building this crate as a `cdylib` produces a native module that
//! [`crate::capability::DylibBackend`] can load. Every returned string is
//! owned by this library and must be released with
//! `shell_native_string_free`.

use crate::capability::NativeBackend;
use crate::config::DEFAULT_APP_NAME;
use crate::native::{self, BuiltinBackend};
use once_cell::sync::Lazy;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

/// Environment variable overriding the settings directory name
pub const APP_NAME_ENV_VAR: &str = "SHELL_BRIDGE_APP_NAME";

/// Environment variable pinning the settings document to an explicit file
///
/// Takes precedence over [`APP_NAME_ENV_VAR`]. Read once, on the first call
/// into the library.
pub const SETTINGS_PATH_ENV_VAR: &str = "SHELL_BRIDGE_SETTINGS_PATH";

static BACKEND: Lazy<BuiltinBackend> = Lazy::new(|| {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV_VAR) {
        return BuiltinBackend::with_settings_path(PathBuf::from(path));
    }

    let app_name =
        std::env::var(APP_NAME_ENV_VAR).unwrap_or_else(|_| DEFAULT_APP_NAME.to_string());
    BuiltinBackend::new(&app_name)
});

fn into_raw(value: String) -> *mut c_char {
    CString::new(value)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Greeting from the native module
#[no_mangle]
pub extern "C" fn shell_native_hello() -> *mut c_char {
    into_raw(native::hello())
}

/// Add two numbers
#[no_mangle]
pub extern "C" fn shell_native_add(a: f64, b: f64) -> f64 {
    native::add(a, b)
}

/// Stored settings document; null on failure
#[no_mangle]
pub extern "C" fn shell_native_load_config() -> *mut c_char {
    BACKEND
        .load_config()
        .map(into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Validate and persist a settings document
///
/// # Safety
/// `json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn shell_native_save_config(json: *const c_char) -> bool {
    if json.is_null() {
        return false;
    }

    // SAFETY: non-null and NUL-terminated per the contract above.
    match unsafe { CStr::from_ptr(json) }.to_str() {
        Ok(text) => BACKEND.save_config(text).unwrap_or(false),
        Err(_) => false,
    }
}

/// Settings document location; null on failure
#[no_mangle]
pub extern "C" fn shell_native_get_config_path() -> *mut c_char {
    BACKEND
        .get_config_path()
        .map(into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Release a string returned by this library
///
/// # Safety
/// `ptr` must be null or a pointer previously returned by this library and
/// not yet freed.
#[no_mangle]
pub unsafe extern "C" fn shell_native_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        // SAFETY: allocated by `CString::into_raw` in `into_raw`.
        drop(unsafe { CString::from_raw(ptr) });
    }
}
