//! Native computations that the renderer cannot perform from its sandbox.

use serde::{Deserialize, Serialize};

/// Greeting with host details unavailable to the isolated renderer
pub fn hello() -> String {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!(
        "Native Rust backend with full system access. CPU cores: {}, Kernel: {}",
        cores,
        kernel_version()
    )
}

/// Kernel release on Linux, OS name elsewhere
fn kernel_version() -> String {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
    #[cfg(not(target_os = "linux"))]
    {
        std::env::consts::OS.to_string()
    }
}

/// Add two numbers
pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

/// Host platform description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system (linux, macos, windows, ...)
    pub platform: String,
    /// CPU architecture
    pub arch: String,
    /// OS family (unix, windows)
    pub family: String,
}

/// Describe the running host
pub fn system_info() -> SystemInfo {
    SystemInfo {
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        family: std::env::consts::FAMILY.to_string(),
    }
}
