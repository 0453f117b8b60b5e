//! Capability registry
//!
//! Snapshot of the operations one MCP server declared during discovery. The
//! registry is rebuilt for every session and never mutated afterwards.

use crate::application::tooling::{ToolInvokeError, ToolServerInterface};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not list operations: {0}")]
    Unavailable(#[from] ToolInvokeError),
    #[error("malformed tools/list response: {0}")]
    Malformed(String),
}

/// One operation the backend can perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    operations: Vec<OperationDescriptor>,
    instructions: Option<String>,
}

impl CapabilityRegistry {
    /// Query a live connection for its declared operations.
    pub async fn discover(connection: &dyn ToolServerInterface) -> Result<Self, DiscoveryError> {
        let listing = connection.list_tools().await?;
        let mut registry = Self::from_listing(&listing)?;
        registry.instructions = connection.instructions().await;
        info!(
            server = connection.name(),
            operations = registry.len(),
            "Discovered backend operations"
        );
        Ok(registry)
    }

    /// Build a registry from a raw `tools/list` result.
    pub fn from_listing(listing: &Value) -> Result<Self, DiscoveryError> {
        let tools = listing
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| DiscoveryError::Malformed("missing 'tools' array".into()))?;

        let mut operations = Vec::with_capacity(tools.len());
        for (index, tool) in tools.iter().enumerate() {
            let name = tool
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    DiscoveryError::Malformed(format!("tool #{index} has no name"))
                })?;
            let input_schema = match tool.get("inputSchema") {
                None | Some(Value::Null) => json!({ "type": "object", "properties": {} }),
                Some(schema @ Value::Object(_)) => schema.clone(),
                Some(_) => {
                    return Err(DiscoveryError::Malformed(format!(
                        "tool '{name}' has a non-object inputSchema"
                    )));
                }
            };
            let description = tool
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            debug!(tool = name, "Registered operation");
            operations.push(OperationDescriptor {
                name: name.to_string(),
                description,
                input_schema,
            });
        }

        Ok(Self {
            operations,
            instructions: None,
        })
    }

    /// Operation list in the shape the agent consumes.
    pub fn to_agent_schema(&self) -> Vec<Value> {
        self.operations
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "description": op.description,
                    "input_schema": op.input_schema,
                })
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations
            .iter()
            .find(|op| op.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name.as_str()).collect()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
