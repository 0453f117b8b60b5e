//! JSON-RPC 2.0 framing shared by the MCP client and server.

pub mod types;

pub use types::{JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse};
