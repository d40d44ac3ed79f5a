//! Request and response frames.
//!
//! Frames are MessagePack-encoded so only value data crosses the boundary.
//! Each request gets exactly one response carrying the same id.

use crate::error::{BridgeError, Result};
use crate::value::BridgeValue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A call from the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Correlation id
    pub id: Uuid,
    /// Wire channel name
    pub channel: String,
    /// Positional arguments
    pub args: Vec<BridgeValue>,
}

impl RpcRequest {
    /// Create a request with a fresh id
    pub fn new(channel: impl Into<String>, args: Vec<BridgeValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            args,
        }
    }

    /// Encode to a frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decode from a frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(frame)?)
    }
}

/// Settlement of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcOutcome {
    /// The operation produced a value (possibly its fallback)
    Resolved(BridgeValue),
    /// The operation failed
    Rejected(BridgeError),
}

impl From<std::result::Result<BridgeValue, BridgeError>> for RpcOutcome {
    fn from(result: std::result::Result<BridgeValue, BridgeError>) -> Self {
        match result {
            Ok(value) => RpcOutcome::Resolved(value),
            Err(e) => RpcOutcome::Rejected(e),
        }
    }
}

/// The gateway's answer to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Id of the request being answered
    pub id: Uuid,
    /// Resolved value or rejection
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    /// Encode to a frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decode from a frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RpcRequest::new("rust-hello", vec![]);
        let b = RpcRequest::new("rust-hello", vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_request_frame() {
        let request = RpcRequest::new(
            "rust-add",
            vec![BridgeValue::Number(-1.5), BridgeValue::Number(2.0)],
        );
        let decoded = RpcRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_rejected_response_frame() {
        let response = RpcResponse {
            id: Uuid::new_v4(),
            outcome: RpcOutcome::Rejected(BridgeError::unknown_operation("nope")),
        };
        let decoded = RpcResponse::decode(&response.encode().unwrap()).unwrap();
        match decoded.outcome {
            RpcOutcome::Rejected(e) => assert_eq!(e.code, ErrorCode::UnknownOperation),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_null_value_survives_frame() {
        let response = RpcResponse {
            id: Uuid::new_v4(),
            outcome: RpcOutcome::Resolved(BridgeValue::Null),
        };
        let decoded = RpcResponse::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded.outcome, RpcOutcome::Resolved(BridgeValue::Null));
    }

    #[test]
    fn test_garbage_frame() {
        assert!(RpcRequest::decode(&[0xc1, 0x00, 0x13]).is_err());
    }
}
