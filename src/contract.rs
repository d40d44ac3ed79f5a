//! The renderer's view of the bridge.
//!
//! [`RendererBridge`] is the only thing handed to the isolated rendering
//! context. It exposes one async function per registered operation and
//! nothing else: no raw channel access, no gateway, no native handle.

use crate::bridge::message::{RpcOutcome, RpcRequest, RpcResponse};
use crate::bridge::operation::{Operation, OPERATIONS};
use crate::error::{Result, ShellError};
use crate::value::BridgeValue;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

type Pending = Arc<DashMap<Uuid, oneshot::Sender<RpcOutcome>>>;

/// Renderer-side handle to the bridge
#[derive(Clone)]
pub struct RendererBridge {
    outbound: mpsc::Sender<Vec<u8>>,
    pending: Pending,
}

impl RendererBridge {
    /// Wrap the two frame channels and start routing responses
    pub(crate) fn new(outbound: mpsc::Sender<Vec<u8>>, inbound: mpsc::Receiver<Vec<u8>>) -> Self {
        let pending: Pending = Arc::new(DashMap::new());
        tokio::spawn(route_responses(inbound, Arc::clone(&pending)));
        Self { outbound, pending }
    }

    /// Names of the functions visible to the renderer
    pub fn exposed_functions(&self) -> impl Iterator<Item = &'static str> {
        OPERATIONS.iter().map(|spec| spec.exposed_as)
    }

    /// `rustHello()`
    pub async fn rust_hello(&self) -> Result<String> {
        let value = self.invoke(Operation::Hello, vec![]).await?;
        expect_string(Operation::Hello, value)
    }

    /// `rustAdd(a, b)`; `None` when the native backend is absent
    pub async fn rust_add(&self, a: f64, b: f64) -> Result<Option<f64>> {
        match self.invoke(Operation::Add, vec![a.into(), b.into()]).await? {
            BridgeValue::Null => Ok(None),
            BridgeValue::Number(n) => Ok(Some(n)),
            other => Err(unexpected(Operation::Add, &other)),
        }
    }

    /// `loadConfig()`
    pub async fn load_config(&self) -> Result<String> {
        let value = self.invoke(Operation::LoadConfig, vec![]).await?;
        expect_string(Operation::LoadConfig, value)
    }

    /// `saveConfig(json)`
    pub async fn save_config(&self, json: &str) -> Result<bool> {
        match self.invoke(Operation::SaveConfig, vec![json.into()]).await? {
            BridgeValue::Bool(saved) => Ok(saved),
            other => Err(unexpected(Operation::SaveConfig, &other)),
        }
    }

    /// `getConfigPath()`
    pub async fn get_config_path(&self) -> Result<String> {
        let value = self.invoke(Operation::GetConfigPath, vec![]).await?;
        expect_string(Operation::GetConfigPath, value)
    }

    async fn invoke(&self, operation: Operation, args: Vec<BridgeValue>) -> Result<BridgeValue> {
        let request = RpcRequest::new(operation.channel(), args);
        let frame = request.encode()?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(request.id, tx);
        let _entry = PendingEntry {
            pending: &self.pending,
            id: request.id,
        };

        if self.outbound.send(frame).await.is_err() {
            return Err(ShellError::Disconnected);
        }

        match rx.await.map_err(|_| ShellError::Disconnected)? {
            RpcOutcome::Resolved(value) => Ok(value),
            RpcOutcome::Rejected(e) => Err(ShellError::Rejected(e)),
        }
    }
}

/// Removes a request's waiter however the call ends, including when the
/// caller drops the future mid-flight
struct PendingEntry<'a> {
    pending: &'a Pending,
    id: Uuid,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

async fn route_responses(mut inbound: mpsc::Receiver<Vec<u8>>, pending: Pending) {
    while let Some(frame) = inbound.recv().await {
        let response = match RpcResponse::decode(&frame) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable response frame");
                continue;
            }
        };

        match pending.remove(&response.id) {
            Some((_, waiter)) => {
                // The caller may have given up on the future.
                let _ = waiter.send(response.outcome);
            }
            None => debug!(id = %response.id, "Response for unknown request"),
        }
    }

    // Dropping the senders wakes every waiter with Disconnected.
    pending.clear();
}

fn expect_string(operation: Operation, value: BridgeValue) -> Result<String> {
    match value {
        BridgeValue::String(s) => Ok(s),
        other => Err(unexpected(operation, &other)),
    }
}

fn unexpected(operation: Operation, value: &BridgeValue) -> ShellError {
    ShellError::UnexpectedValue {
        channel: operation.channel(),
        value: format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{connect, BridgeGateway};
    use crate::capability::NativeCapability;
    use crate::error::ErrorCode;
    use crate::test_support::FailingBackend;
    use std::time::Duration;

    fn absent() -> RendererBridge {
        let gateway = BridgeGateway::new(NativeCapability::Unavailable("missing".into()));
        connect(Arc::new(gateway), 8)
    }

    #[tokio::test]
    async fn test_exposed_functions() {
        let bridge = absent();
        let names: Vec<_> = bridge.exposed_functions().collect();
        assert_eq!(
            names,
            ["rustHello", "rustAdd", "loadConfig", "saveConfig", "getConfigPath"]
        );
    }

    #[tokio::test]
    async fn test_fallback_sequence() {
        let bridge = absent();
        let hello = bridge.rust_hello().await.unwrap();
        assert!(hello.starts_with("Native backend not loaded"));
        assert_eq!(bridge.rust_add(1.0, 1.0).await.unwrap(), None);
        assert_eq!(bridge.load_config().await.unwrap(), "{}");
        assert!(!bridge.save_config("{}").await.unwrap());
        assert_eq!(bridge.get_config_path().await.unwrap(), "unknown");
    }

    #[tokio::test]
    async fn test_live_failure_surfaces_as_rejection() {
        let gateway = BridgeGateway::new(NativeCapability::Loaded(Arc::new(FailingBackend)));
        let bridge = connect(Arc::new(gateway), 8);

        match bridge.save_config("{}").await {
            Err(ShellError::Rejected(e)) => assert_eq!(e.code, ErrorCode::NativeFailure),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(bridge.rust_add(2.0, 2.0).await.unwrap(), Some(4.0));
    }

    #[tokio::test]
    async fn test_settled_calls_leave_no_waiters() {
        let bridge = absent();
        bridge.rust_hello().await.unwrap();
        bridge.save_config("{}").await.unwrap();
        assert!(bridge.pending.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_call_releases_waiter() {
        let (request_tx, _request_rx) = mpsc::channel(1);
        let (_response_tx, response_rx) = mpsc::channel(1);
        // Fill the request channel so the next send blocks.
        request_tx.send(Vec::new()).await.unwrap();

        let bridge = RendererBridge::new(request_tx, response_rx);
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), bridge.load_config()).await;
        assert!(abandoned.is_err());
        assert!(bridge.pending.is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_gateway() {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (response_tx, response_rx) = mpsc::channel(1);
        drop(request_rx);
        drop(response_tx);

        let bridge = RendererBridge::new(request_tx, response_rx);
        assert!(matches!(
            bridge.rust_hello().await,
            Err(ShellError::Disconnected)
        ));
    }
}
