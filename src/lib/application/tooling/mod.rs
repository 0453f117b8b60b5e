//! MCP server connections: the child-process transport and the in-process one.

mod error;
mod interface;
mod local;
mod process;

pub use error::ToolInvokeError;
pub use interface::ToolServerInterface;
pub use local::LocalServer;
pub use process::McpProcess;
