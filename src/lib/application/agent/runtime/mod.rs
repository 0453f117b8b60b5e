mod context;
mod instructions;
mod parser;

pub(super) use super::context::{ServerGuidance, ToolContext, ToolDescriptor};
pub(super) use super::directive::AgentDirective;
pub(super) use super::errors::AgentError;
pub(super) use serde_json::{Value, json};

pub(super) use instructions::JSON_RETRY_MESSAGE;
pub use parser::extract_json;

/// Per-session view of the backend's tools, plus the JSON action protocol
/// spoken with the model.
pub struct ToolRuntime {
    context: ToolContext,
}

impl ToolRuntime {
    pub fn context(&self) -> &ToolContext {
        &self.context
    }
}
