use crate::application::formatter::format_error;
use crate::domain::ErrorKind;
use serde_json::{Value, json};

/// Result of one `tools/call`, before MCP framing.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub text: String,
    pub error: Option<ErrorKind>,
    pub structured: Value,
}

impl ToolOutcome {
    pub fn ok(text: impl Into<String>, structured: Value) -> Self {
        Self {
            text: text.into(),
            error: None,
            structured,
        }
    }

    pub fn failed(kind: ErrorKind, detail: impl AsRef<str>) -> Self {
        let detail = detail.as_ref().trim().to_string();
        Self {
            text: format_error(kind, &detail),
            error: Some(kind),
            structured: json!({
                "error": {
                    "kind": kind.as_str(),
                    "message": detail,
                }
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// MCP `CallToolResult` payload.
    pub fn into_call_result(self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.error.is_some(),
        });
        if !self.structured.is_null() {
            if let Some(map) = result.as_object_mut() {
                map.insert("structuredContent".to_string(), self.structured);
            }
        }
        result
    }
}
