use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

/// A live connection to one MCP server.
///
/// Implementations multiplex concurrent calls; `close` is idempotent.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    fn name(&self) -> &str;

    /// Run the `initialize` handshake.
    async fn connect(&self) -> Result<(), ToolInvokeError>;

    /// Raw `tools/list` result.
    async fn list_tools(&self) -> Result<Value, ToolInvokeError>;

    /// Raw `tools/call` result.
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError>;

    /// Instructions the server sent during the handshake, if any.
    async fn instructions(&self) -> Option<String>;

    fn is_connected(&self) -> bool;

    async fn close(&self);
}
