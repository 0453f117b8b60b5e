use super::{ToolRuntime, Value, json};
use crate::domain::InvocationResult;

pub(crate) const JSON_RETRY_MESSAGE: &str = "Your previous reply was not a valid action. \
Respond again with exactly one JSON object using the call_tool, call_tools or final action, \
without commentary or code fences.";

pub(crate) const TOOL_RESULT_INSTRUCTION: &str = "These are the results of your tool calls, \
in the order you requested them. Call more tools if needed, otherwise answer with the final action.";

impl ToolRuntime {
    pub fn compose_system_instructions(&self) -> String {
        let mut lines = vec![
            "You are an assistant that reads Jira issues and publishes Confluence pages by calling tools."
                .to_string(),
            "All responses must be valid JSON without commentary or code fences.".to_string(),
            "To invoke one tool, respond with: {\"action\":\"call_tool\",\"id\":\"call-1\",\"tool\":\"tool_name\",\"input\":{...}}."
                .to_string(),
            "To invoke several independent tools at once, respond with: {\"action\":\"call_tools\",\"calls\":[{\"id\":\"call-1\",\"tool\":\"tool_name\",\"input\":{...}}]}."
                .to_string(),
            "When you are ready to give the final answer to the user, respond with: {\"action\":\"final\",\"response\":\"...\"}."
                .to_string(),
            "A failed tool call comes back as a result with an error kind; decide whether to retry with different input or explain the failure."
                .to_string(),
        ];

        let context = self.context();
        if context.is_empty() {
            lines.push("The backend currently offers no tools.".to_string());
            return lines.join(" ");
        }

        for guidance in &context.servers {
            lines.push(format!(
                "Server '{}' guidance: {}",
                guidance.name, guidance.instruction
            ));
        }

        if !context.tools.is_empty() {
            lines.push("Available tools:".to_string());
            for descriptor in &context.tools {
                let mut line = format!("- {}", descriptor.name);
                if let Some(description) = &descriptor.description {
                    line.push_str(&format!(": {description}"));
                }
                let compact = serde_json::to_string(&descriptor.input_schema).unwrap_or_default();
                line.push_str(&format!(". Input schema: {compact}"));
                lines.push(line);
            }
        }

        lines.join(" ")
    }

    pub fn initial_user_prompt(&self, prompt: &str, tools: Vec<Value>) -> String {
        let mut payload = json!({
            "action": "user_request",
            "prompt": prompt,
        });
        if !tools.is_empty() {
            if let Some(map) = payload.as_object_mut() {
                map.insert("tools".to_string(), Value::Array(tools));
            }
        }
        payload.to_string()
    }

    /// One message carrying every result of a round, in request order.
    pub fn tool_results_message(&self, round: usize, results: &[InvocationResult]) -> String {
        let entries: Vec<Value> = results
            .iter()
            .map(|result| {
                json!({
                    "id": result.invocation_id,
                    "tool": result.operation_name,
                    "status": result.status,
                    "error_kind": result.error_kind,
                    "output": result.payload,
                })
            })
            .collect();
        json!({
            "round": round,
            "tool_results": entries,
            "instruction": TOOL_RESULT_INSTRUCTION,
        })
        .to_string()
    }
}
