//! Line-delimited JSON-RPC 2.0 over stdio carrying the tool surface.
//!
//! Protocol flow:
//!   1. Client sends `initialize` -> server returns capabilities
//!   2. Client sends `notifications/initialized`
//!   3. Client sends `tools/list` -> published surface entries
//!   4. Client sends `tools/call` -> InvocationResult envelope

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::warn;

use secmesh_core::CancelFlag;
use secmesh_gateway::Gateway;

/// Maximum request size (10 MB).
const MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

pub async fn run(gateway: Gateway) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() > MAX_REQUEST_SIZE {
            send(&mut stdout, error_response(Value::Null, -32600, "Request exceeds 10MB size limit")).await?;
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                send(&mut stdout, error_response(Value::Null, -32700, &format!("Parse error: {e}"))).await?;
                continue;
            }
        };

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        match method {
            "initialize" => {
                let result = json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "secmesh", "version": env!("CARGO_PKG_VERSION")},
                });
                send(&mut stdout, ok_response(id, result)).await?;
            }
            "notifications/initialized" | "initialized" => {}
            "ping" => {
                send(&mut stdout, ok_response(id, json!({}))).await?;
            }
            "tools/list" => {
                let result = json!({"tools": gateway.list_tools()});
                send(&mut stdout, ok_response(id, result)).await?;
            }
            "tools/call" => {
                let name = params.get("name").and_then(Value::as_str).unwrap_or("");
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                let cancel = CancelFlag::new();
                let invocation = gateway.call_tool(name, &arguments, &cancel).await;
                send(&mut stdout, ok_response(id, serde_json::to_value(invocation)?)).await?;
            }
            other => {
                // Notifications (no id) are silently ignored.
                if let Some(id) = id {
                    warn!(method = %other, "unknown method");
                    send(
                        &mut stdout,
                        error_response(id, -32601, &format!("Method not found: {other}")),
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}

fn ok_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "result": result,
    })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message},
    })
}

async fn send(stdout: &mut Stdout, response: Value) -> Result<()> {
    let mut payload = serde_json::to_vec(&response)?;
    payload.push(b'\n');
    stdout.write_all(&payload).await?;
    stdout.flush().await?;
    Ok(())
}
