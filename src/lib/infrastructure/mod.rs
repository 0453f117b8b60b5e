//! External systems: the Atlassian REST APIs, the MCP server built on them,
//! JSON-RPC framing, and LLM providers.

pub mod atlassian;
pub mod mcp_server;
pub mod model;
pub mod rpc;
