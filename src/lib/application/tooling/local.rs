use super::error::ToolInvokeError;
use super::interface::ToolServerInterface;
use crate::infrastructure::mcp_server::AtlassianService;
use crate::infrastructure::rpc::{JSONRPC_VERSION, RpcRequest};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

const LOCAL_SERVER_NAME: &str = "atlassian-local";

/// In-process connection to an [`AtlassianService`].
///
/// Speaks the same JSON-RPC messages as the stdio transport, without a pipe.
pub struct LocalServer {
    service: AtlassianService,
    connected: AtomicBool,
    id_counter: AtomicU64,
    instructions: AsyncMutex<Option<String>>,
}

impl LocalServer {
    pub fn new(service: AtlassianService) -> Self {
        Self {
            service,
            connected: AtomicBool::new(false),
            id_counter: AtomicU64::new(1),
            instructions: AsyncMutex::new(None),
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: Some(params),
            id: Some(json!(id)),
        };
        debug!(request_id = id, method, "Dispatching in-process MCP request");

        let Some(response) = self.service.handle_request(request).await else {
            return Err(self.transport_error("request produced no response"));
        };
        if let Some(error) = response.error {
            return Err(ToolInvokeError::Rpc {
                server: LOCAL_SERVER_NAME.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn ensure_connected(&self) -> Result<(), ToolInvokeError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ToolInvokeError::Closed {
                server: LOCAL_SERVER_NAME.to_string(),
            })
        }
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: LOCAL_SERVER_NAME.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl ToolServerInterface for LocalServer {
    fn name(&self) -> &str {
        LOCAL_SERVER_NAME
    }

    async fn connect(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": crate::infrastructure::mcp_server::PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let result = self.send_request("initialize", params).await?;
        if let Some(text) = result.get("instructions").and_then(Value::as_str) {
            *self.instructions.lock().await = Some(text.to_string());
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Value, ToolInvokeError> {
        self.ensure_connected()?;
        self.send_request("tools/list", json!({})).await
    }

    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        self.ensure_connected()?;
        self.send_request(
            "tools/call",
            json!({ "name": tool, "arguments": arguments }),
        )
        .await
    }

    async fn instructions(&self) -> Option<String> {
        self.instructions.lock().await.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::atlassian::InMemoryAtlassian;
    use std::sync::Arc;

    #[tokio::test]
    async fn handshake_then_calls_until_closed() {
        let server = LocalServer::new(AtlassianService::in_memory(Arc::new(
            InMemoryAtlassian::default(),
        )));
        assert!(matches!(
            server.list_tools().await,
            Err(ToolInvokeError::Closed { .. })
        ));

        server.connect().await.expect("handshake");
        assert!(server.instructions().await.is_some());
        let tools = server.list_tools().await.expect("tools");
        assert_eq!(tools["tools"].as_array().map(Vec::len), Some(3));

        server.close().await;
        assert!(!server.is_connected());
        assert!(matches!(
            server.call_tool("get_jira_ticket", json!({})).await,
            Err(ToolInvokeError::Closed { .. })
        ));
    }
}
