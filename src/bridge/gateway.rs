//! The privileged side of the bridge.
//!
//! The gateway owns the native capability, resolves each request against the
//! shared operation table and settles it with the live result, the
//! operation's fallback, or a rejection.

use super::message::{RpcRequest, RpcResponse};
use super::operation::Operation;
use crate::capability::{NativeBackend, NativeCapability, NativeError};
use crate::error::{BridgeError, Result};
use crate::metrics::{BridgeMetrics, DispatchTimer, Settlement};
use crate::persistence;
use crate::value::BridgeValue;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// A validated call into a live backend
#[derive(Debug, Clone, PartialEq)]
enum NativeCall {
    Hello,
    Add(f64, f64),
    LoadConfig,
    SaveConfig(String),
    GetConfigPath,
}

impl NativeCall {
    /// Check arguments against the operation's shape
    fn parse(
        operation: Operation,
        args: Vec<BridgeValue>,
    ) -> std::result::Result<Self, BridgeError> {
        let spec = operation.spec();
        if args.len() != spec.arity {
            return Err(BridgeError::invalid_argument(
                spec.channel,
                format!("expected {} argument(s), got {}", spec.arity, args.len()),
            ));
        }

        let mut args = args.into_iter();
        let call = match operation {
            Operation::Hello => NativeCall::Hello,
            Operation::Add => {
                let a = number_arg(spec.channel, args.next())?;
                let b = number_arg(spec.channel, args.next())?;
                NativeCall::Add(a, b)
            }
            Operation::LoadConfig => NativeCall::LoadConfig,
            Operation::SaveConfig => match args.next() {
                Some(BridgeValue::String(text)) => NativeCall::SaveConfig(text),
                other => {
                    return Err(BridgeError::invalid_argument(
                        spec.channel,
                        format!("expected string, got {}", describe(other.as_ref())),
                    ))
                }
            },
            Operation::GetConfigPath => NativeCall::GetConfigPath,
        };
        Ok(call)
    }

    fn invoke(self, backend: &dyn NativeBackend) -> std::result::Result<BridgeValue, NativeError> {
        match self {
            NativeCall::Hello => backend.hello().map(BridgeValue::from),
            NativeCall::Add(a, b) => backend.add(a, b).map(BridgeValue::from),
            NativeCall::LoadConfig => persistence::load(backend).map(BridgeValue::from),
            NativeCall::SaveConfig(text) => {
                persistence::save(backend, &text).map(BridgeValue::from)
            }
            NativeCall::GetConfigPath => {
                persistence::resolve_path(backend).map(BridgeValue::from)
            }
        }
    }
}

fn number_arg(channel: &str, value: Option<BridgeValue>) -> std::result::Result<f64, BridgeError> {
    match value {
        Some(BridgeValue::Number(n)) => Ok(n),
        other => Err(BridgeError::invalid_argument(
            channel,
            format!("expected number, got {}", describe(other.as_ref())),
        )),
    }
}

fn describe(value: Option<&BridgeValue>) -> &'static str {
    value.map(BridgeValue::type_name).unwrap_or("nothing")
}

/// Dispatches bridge requests
pub struct BridgeGateway {
    capability: NativeCapability,
    metrics: Arc<BridgeMetrics>,
}

impl BridgeGateway {
    /// Create a gateway over an acquired capability
    pub fn new(capability: NativeCapability) -> Self {
        info!(
            loaded = capability.is_loaded(),
            reason = capability.unavailable_reason().unwrap_or(""),
            "Registering bridge operations"
        );

        Self {
            capability,
            metrics: Arc::new(BridgeMetrics::new()),
        }
    }

    /// The capability this gateway serves from
    pub fn capability(&self) -> &NativeCapability {
        &self.capability
    }

    /// Dispatch metrics
    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Settle one call
    ///
    /// An absent backend always resolves with the operation's fallback. A
    /// live backend's failure rejects; it is never replaced by a fallback.
    #[instrument(skip(self, args), fields(channel = %channel))]
    pub async fn dispatch(
        &self,
        channel: &str,
        args: Vec<BridgeValue>,
    ) -> std::result::Result<BridgeValue, BridgeError> {
        let timer = DispatchTimer::start();

        let Some(operation) = Operation::from_channel(channel) else {
            warn!("Rejected call on unregistered channel");
            self.metrics.record_unknown_channel();
            return Err(BridgeError::unknown_operation(channel));
        };

        let result = match &self.capability {
            NativeCapability::Loaded(backend) => {
                self.call_live(operation, Arc::clone(backend), args).await
            }
            NativeCapability::Unavailable(_) => {
                debug!("Native backend absent, resolving fallback");
                self.metrics
                    .record(operation, Settlement::Fallback, timer.elapsed());
                return Ok(operation.fallback());
            }
        };

        let settlement = match &result {
            Ok(_) => Settlement::Live,
            Err(e) => {
                warn!(error = %e, "Native call rejected");
                Settlement::Rejected(e.code)
            }
        };
        self.metrics.record(operation, settlement, timer.elapsed());
        result
    }

    async fn call_live(
        &self,
        operation: Operation,
        backend: Arc<dyn NativeBackend>,
        args: Vec<BridgeValue>,
    ) -> std::result::Result<BridgeValue, BridgeError> {
        let call = NativeCall::parse(operation, args)?;

        // Native code may block; keep it off the scheduler threads.
        tokio::task::spawn_blocking(move || call.invoke(backend.as_ref()))
            .await
            .map_err(|e| BridgeError::native_failure(format!("native call aborted: {}", e)))?
            .map_err(BridgeError::from)
    }

    /// Decode a request frame, dispatch it and encode the response frame
    ///
    /// Fails only when the request cannot be decoded (there is no id to
    /// answer) or the response cannot be encoded.
    pub async fn handle_frame(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let request = RpcRequest::decode(frame)?;
        let outcome = self.dispatch(&request.channel, request.args).await.into();
        RpcResponse {
            id: request.id,
            outcome,
        }
        .encode()
    }

    /// Serve request frames until every sender is dropped
    ///
    /// Each request runs as its own task; responses are sent in completion
    /// order, not request order.
    pub async fn serve(
        self: Arc<Self>,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        outbound: mpsc::Sender<Vec<u8>>,
    ) {
        info!("Bridge gateway serving");

        while let Some(frame) = inbound.recv().await {
            let gateway = Arc::clone(&self);
            let outbound = outbound.clone();

            tokio::spawn(async move {
                match gateway.handle_frame(&frame).await {
                    Ok(response) => {
                        if outbound.send(response).await.is_err() {
                            debug!("Renderer disconnected, dropping response");
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping undecodable request frame"),
                }
            });
        }

        info!("Bridge gateway stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::message::RpcOutcome;
    use crate::bridge::operation::OPERATIONS;
    use crate::error::ErrorCode;
    use crate::test_support::FailingBackend;

    fn absent() -> BridgeGateway {
        BridgeGateway::new(NativeCapability::Unavailable("not built".into()))
    }

    fn loaded(backend: impl NativeBackend + 'static) -> BridgeGateway {
        BridgeGateway::new(NativeCapability::Loaded(Arc::new(backend)))
    }

    #[tokio::test]
    async fn test_absent_backend_resolves_fallbacks() {
        let gateway = absent();

        for spec in OPERATIONS.iter() {
            let value = gateway.dispatch(spec.channel, vec![]).await.unwrap();
            assert_eq!(value, spec.operation.fallback());
        }
    }

    #[tokio::test]
    async fn test_absent_backend_ignores_argument_shape() {
        let gateway = absent();
        let value = gateway
            .dispatch("rust-add", vec![BridgeValue::from("two")])
            .await
            .unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_unknown_channel_rejected() {
        let gateway = absent();
        let err = gateway.dispatch("open-devtools", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownOperation);
        assert_eq!(gateway.metrics().snapshot().unknown_channel, 1);
    }

    #[tokio::test]
    async fn test_live_add() {
        let gateway = loaded(crate::native::BuiltinBackend::with_settings_path(
            std::env::temp_dir().join("shell-bridge-gateway-add.json"),
        ));
        let value = gateway
            .dispatch(
                "rust-add",
                vec![BridgeValue::from(-7.0), BridgeValue::from(3.0)],
            )
            .await
            .unwrap();
        assert_eq!(value, BridgeValue::Number(-4.0));
        assert_eq!(gateway.metrics().operation(Operation::Add).live, 1);
    }

    #[tokio::test]
    async fn test_live_add_rejects_bad_arguments() {
        let gateway = loaded(FailingBackend);
        let err = gateway
            .dispatch("rust-add", vec![BridgeValue::from(1.0)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let err = gateway
            .dispatch(
                "rust-add",
                vec![BridgeValue::from(1.0), BridgeValue::from("x")],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert!(err.message.contains("expected number, got string"));
    }

    #[tokio::test]
    async fn test_live_failure_is_not_replaced_by_fallback() {
        let gateway = loaded(FailingBackend);
        let err = gateway.dispatch("load-config", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NativeFailure);
        assert!(err.message.contains("store offline"));
    }

    #[tokio::test]
    async fn test_live_panic_rejects() {
        let gateway = loaded(FailingBackend);
        let err = gateway.dispatch("rust-hello", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NativeFailure);
    }

    #[tokio::test]
    async fn test_handle_frame_round_trip() {
        let gateway = absent();
        let request = RpcRequest::new("get-config-path", vec![]);
        let response = RpcResponse::decode(
            &gateway.handle_frame(&request.encode().unwrap()).await.unwrap(),
        )
        .unwrap();

        assert_eq!(response.id, request.id);
        assert_eq!(
            response.outcome,
            RpcOutcome::Resolved(BridgeValue::from("unknown"))
        );
    }

    #[tokio::test]
    async fn test_handle_frame_rejects_garbage() {
        let gateway = absent();
        assert!(gateway.handle_frame(b"\xc1garbage").await.is_err());
    }
}
