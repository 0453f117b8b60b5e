//! Chat model access for the agent loop
//!
//! [`ModelProvider`] is the seam the agent talks through. The shipped
//! implementation, [`DynamicModelProvider`], routes each request to a
//! configured provider whose [`ChatClient`] speaks either the OpenAI
//! chat-completions dialect or Ollama's `/api/chat`.

mod client;
mod provider;
mod types;

pub use client::{ChatClient, Dialect, resolve_api_key};
pub use provider::{DynamicModelProvider, ModelProvider};
pub use types::{ModelError, ModelRequest, ModelResponse};
