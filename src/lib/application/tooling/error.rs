use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("failed to spawn MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP server '{server}' did not finish its handshake within {seconds}s")]
    StartupTimeout { server: String, seconds: u64 },
    #[error("MCP server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("MCP server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("MCP server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("MCP server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("MCP server '{server}' connection is closed")]
    Closed { server: String },
    #[error("MCP server '{server}' request cancelled")]
    Cancelled { server: String },
}

impl ToolInvokeError {
    /// True when the failure means the connection itself is gone, as opposed
    /// to the server rejecting one request.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. }
                | Self::StartupTimeout { .. }
                | Self::Transport { .. }
                | Self::Terminated { .. }
                | Self::Closed { .. }
                | Self::Cancelled { .. }
        )
    }
}
