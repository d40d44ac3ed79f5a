//! # Shell Bridge
//!
//! This library connects an isolated rendering context to a privileged host
//! that may or may not have a native compute module available. The renderer
//! sees a fixed set of async functions; the host decides whether each call
//! is answered by the native module or by a fixed fallback value.
//!
//! ## Architecture
//!
//! ```text
//! Renderer (RendererBridge)
//!     │
//!     │ MessagePack frames over a channel
//!     ▼
//! Bridge Gateway (this crate)
//!     │
//!     │ NativeBackend trait
//!     ▼
//! Native module (dylib or builtin), or absent
//! ```
//!
//! ## Features
//!
//! - **Graceful Degradation**: Every operation resolves when the native module is missing
//! - **Narrow Surface**: The renderer can only reach registered operations
//! - **Settings Persistence**: Load, validate and save the application settings document
//! - **C ABI Export**: The builtin backend doubles as a loadable native module

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bridge;
pub mod capability;
pub mod config;
pub mod contract;
pub mod error;
pub mod ffi;
pub mod lifecycle;
pub mod metrics;
pub mod native;
pub mod persistence;
pub mod value;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use bridge::{connect, launch, BridgeGateway, Operation, OPERATIONS};
pub use capability::{acquire, CapabilityLoader, NativeBackend, NativeCapability};
pub use config::{BridgeConfig, NativeModuleSource};
pub use contract::RendererBridge;
pub use error::{BridgeError, ErrorCode, ShellError};
pub use lifecycle::{AppLifecycle, LifecycleAction, LifecycleEvent, WindowOptions};
pub use metrics::BridgeMetrics;
pub use native::BuiltinBackend;
pub use value::BridgeValue;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `shell_bridge=info`. Calling it more
/// than once is harmless.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shell_bridge=info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
