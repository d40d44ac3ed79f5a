//! Error types for the bridge.
//!
//! This module defines the error codes and the serializable rejection that
//! crosses the isolation boundary, plus the crate-level error type used on the
//! host side.

use serde::{Deserialize, Serialize};

/// Error codes for categorizing rejected bridge calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Channel name is not in the operation table
    UnknownOperation,
    /// Wrong number or type of arguments for a live call
    InvalidArgument,
    /// The loaded native backend failed while serving the call
    NativeFailure,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UnknownOperation => write!(f, "UNKNOWN_OPERATION"),
            ErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorCode::NativeFailure => write!(f, "NATIVE_FAILURE"),
        }
    }
}

/// Rejection delivered to the renderer in place of a resolved value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeError {
    /// Error code
    pub code: ErrorCode,

    /// Human-readable message
    pub message: String,
}

impl BridgeError {
    /// Create a new bridge error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an unknown operation error
    pub fn unknown_operation(channel: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::UnknownOperation,
            format!("No handler registered for '{}'", channel.into()),
        )
    }

    /// Create an invalid argument error
    pub fn invalid_argument(channel: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidArgument,
            format!("Invalid arguments for '{}': {}", channel, reason.into()),
        )
    }

    /// Create a native failure error
    pub fn native_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NativeFailure, message)
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for BridgeError {}

impl From<crate::capability::NativeError> for BridgeError {
    fn from(e: crate::capability::NativeError) -> Self {
        BridgeError::native_failure(e.to_string())
    }
}

/// Main error type for the host and renderer handles
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The gateway rejected the call
    #[error("Bridge call rejected: {0}")]
    Rejected(#[from] BridgeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Frame encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The gateway side of the channel has gone away
    #[error("Bridge disconnected")]
    Disconnected,

    /// The gateway resolved a value of the wrong shape
    #[error("Unexpected result from '{channel}': {value}")]
    UnexpectedValue {
        /// The channel that produced the value
        channel: &'static str,
        /// Debug rendering of the value
        value: String,
    },
}

impl From<rmp_serde::encode::Error> for ShellError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ShellError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ShellError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ShellError::Serialization(e.to_string())
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, ShellError>;
