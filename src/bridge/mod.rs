//! Bridge wiring between the host and the isolated renderer.
//!
//! The renderer end receives a [`RendererBridge`] holding only a frame
//! channel; the gateway, the capability and the native module stay on the
//! host end.

pub mod gateway;
pub mod message;
pub mod operation;

use crate::capability::{acquire, SourceLoader};
use crate::config::BridgeConfig;
use crate::contract::RendererBridge;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub use gateway::BridgeGateway;
pub use message::{RpcOutcome, RpcRequest, RpcResponse};
pub use operation::{Operation, OperationSpec, OPERATIONS};

/// Start serving `gateway` and return the renderer's end of the channel
///
/// Must be called inside a tokio runtime. The gateway task ends once every
/// clone of the returned handle is dropped.
pub fn connect(gateway: Arc<BridgeGateway>, buffer: usize) -> RendererBridge {
    let (request_tx, request_rx) = mpsc::channel(buffer);
    let (response_tx, response_rx) = mpsc::channel(buffer);

    tokio::spawn(gateway.serve(request_rx, response_tx));
    RendererBridge::new(request_tx, response_rx)
}

/// Acquire the configured native module once and open the bridge
pub fn launch(config: &BridgeConfig) -> Result<(Arc<BridgeGateway>, RendererBridge)> {
    config.validate()?;

    let loader = SourceLoader::new(config.native_module.clone(), config.app_name.clone());
    let gateway = Arc::new(BridgeGateway::new(acquire(&loader)));
    let renderer = connect(Arc::clone(&gateway), config.request_buffer);

    info!(
        app = %config.app_name,
        functions = ?renderer.exposed_functions().collect::<Vec<_>>(),
        "Bridge launched"
    );
    Ok((gateway, renderer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NativeModuleSource;

    #[tokio::test]
    async fn test_launch_disabled() {
        let config = BridgeConfig::new().with_native_module(NativeModuleSource::Disabled);
        let (gateway, renderer) = launch(&config).unwrap();

        assert!(!gateway.capability().is_loaded());
        assert_eq!(renderer.load_config().await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_launch_rejects_invalid_config() {
        let config = BridgeConfig::new().with_request_buffer(0);
        assert!(launch(&config).is_err());
    }
}
