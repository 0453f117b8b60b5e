//! # Application Module
//!
//! The tool-invocation bridge between a reasoning agent and an MCP backend.
//!
//! ## Submodules
//!
//! - [`tooling`] - MCP connections (child process over stdio, or in-process)
//! - [`registry`] - operations discovered on a connection
//! - [`executor`] - validates and runs invocation requests
//! - [`session`] - connection lifecycle for one user request
//! - [`agent`] - the turn loop that talks to the model
//! - [`bridge`] - entry point tying the above together
//! - [`formatter`] - text and HTML rendering of backend records

pub mod agent;
pub mod bridge;
pub mod executor;
pub mod formatter;
pub mod registry;
pub mod session;
pub mod tooling;
