//! # MCP Server
//!
//! Server side of the bridge: exposes the Jira/Confluence operations as MCP
//! tools over newline-delimited JSON-RPC.
//!
//! - [`catalogue`] - tool names and their input schemas
//! - [`AtlassianService`] - tool handlers over the [`IssueTracker`] and [`Wiki`] traits
//! - [`serve_stdio`] - stdin/stdout transport loop
//!
//! [`IssueTracker`]: crate::infrastructure::atlassian::IssueTracker
//! [`Wiki`]: crate::infrastructure::atlassian::Wiki

pub mod catalogue;
mod outcome;
mod service;
mod stdio;

pub use outcome::ToolOutcome;
pub use service::AtlassianService;
pub use stdio::{serve, serve_stdio};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "jira-confluence";
