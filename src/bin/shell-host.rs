//! Headless host for the shell bridge.
//!
//! Boots the bridge the way the desktop shell would, then reads one JSON
//! request per line from stdin and answers through the renderer contract:
//!
//! ```text
//! {"call": "rustAdd", "args": [2, 3]}
//! {"call": "saveConfig", "args": ["{\"theme\":\"dark\"}"]}
//! ```
//!
//! An empty line or EOF closes the window and exits.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use shell_bridge::lifecycle::{Platform, COMMAND_LINE_SWITCHES};
use shell_bridge::persistence;
use shell_bridge::{
    init_tracing, launch, AppLifecycle, BridgeConfig, LifecycleAction, LifecycleEvent,
    RendererBridge,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Debug, Deserialize)]
struct HostRequest {
    call: String,
    #[serde(default)]
    args: Vec<Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = BridgeConfig::from_env();
    for (switch, value) in COMMAND_LINE_SWITCHES {
        info!(switch, value = value.unwrap_or(""), "Appending command line switch");
    }

    info!(system = ?shell_bridge::native::system_info(), "Host platform");
    let (gateway, renderer) = launch(&config).context("failed to launch bridge")?;
    if let Ok(document) = persistence::snapshot(gateway.capability()) {
        info!(location = %document.location, "Settings document");
    }

    let mut lifecycle = AppLifecycle::new(Platform::current(), config.resolved_window());
    if let LifecycleAction::CreateWindow(window) = lifecycle.handle(LifecycleEvent::Ready) {
        info!(?window, "Creating window");
        lifecycle.handle(LifecycleEvent::WindowCountChanged(1));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        let reply = match serde_json::from_str::<HostRequest>(line) {
            Ok(request) => match call(&renderer, &request).await {
                Ok(value) => json!({ "call": request.call, "value": value }),
                Err(e) => json!({ "call": request.call, "error": e.to_string() }),
            },
            Err(e) => json!({ "error": format!("malformed request: {}", e) }),
        };
        println!("{}", reply);
    }

    if lifecycle.handle(LifecycleEvent::WindowCountChanged(0)) == LifecycleAction::Quit {
        info!("All windows closed, quitting");
    }

    eprint!("{}", gateway.metrics().to_prometheus());
    Ok(())
}

async fn call(renderer: &RendererBridge, request: &HostRequest) -> Result<Value> {
    let value = match request.call.as_str() {
        "rustHello" => json!(renderer.rust_hello().await?),
        "rustAdd" => {
            let a = number(&request.args, 0)?;
            let b = number(&request.args, 1)?;
            json!(renderer.rust_add(a, b).await?)
        }
        "loadConfig" => json!(renderer.load_config().await?),
        "saveConfig" => {
            let text = request
                .args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("saveConfig expects a string argument"))?;
            json!(renderer.save_config(text).await?)
        }
        "getConfigPath" => json!(renderer.get_config_path().await?),
        other => bail!("{} is not exposed to the renderer", other),
    };
    Ok(value)
}

fn number(args: &[Value], index: usize) -> Result<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("argument {} must be a number", index))
}
