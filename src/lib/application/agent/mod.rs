//! # Agent Module
//!
//! Drives the multi-round exchange between a reasoning model and the
//! backend's tools.
//!
//! ## Key Types
//!
//! - [`Agent`] - the turn loop
//! - [`AgentOptions`] - provider, model, turn limit and dispatch mode
//! - [`AgentOutcome`] - final answer plus every executed step
//! - [`AgentError`] - failures that end a run
//!
//! ## Agent Loop
//!
//! 1. Send the conversation to the model
//! 2. Parse its JSON action (with correction requests on parse failure)
//! 3. If tools were requested, run them through the session's executor and
//!    append all results as one message
//! 4. If a final answer was given, return it

mod context;
mod directive;
mod errors;
mod models;
mod runner;
mod runtime;


pub use context::{ServerGuidance, ToolContext, ToolDescriptor};
pub use directive::AgentDirective;
pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome, AgentStep, DEFAULT_MAX_TURNS};
pub use runner::Agent;
pub use runtime::extract_json;
