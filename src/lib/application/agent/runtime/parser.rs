use super::{AgentDirective, AgentError, ToolRuntime, Value};
use crate::domain::InvocationRequest;
use serde_json::Map as JsonMap;
use std::collections::HashSet;

impl ToolRuntime {
    /// Parse one model reply. Calls without an `id` are numbered
    /// `call-{round}-{n}`.
    pub fn parse_agent_action(
        &self,
        content: &str,
        round: usize,
    ) -> Result<AgentDirective, AgentError> {
        match extract_json(content) {
            Some(value) => parse_action_value(value, round),
            None => Err(AgentError::InvalidResponse(
                "expected JSON object in agent response".into(),
            )),
        }
    }
}

fn parse_action_value(value: Value, round: usize) -> Result<AgentDirective, AgentError> {
    let map = match value {
        Value::Object(map) => map,
        Value::String(text) => {
            return match extract_json(&text) {
                Some(Value::Object(map)) => parse_action_value(Value::Object(map), round),
                _ => Err(AgentError::InvalidResponse(
                    "expected JSON object in agent response".into(),
                )),
            };
        }
        other => {
            return Err(AgentError::InvalidResponse(format!(
                "unsupported response type: {other}"
            )));
        }
    };

    let action = map.get("action").and_then(Value::as_str).ok_or_else(|| {
        AgentError::InvalidResponse("missing action field in agent response".into())
    })?;

    match action {
        "final" => {
            let response = map.get("response").and_then(Value::as_str).ok_or_else(|| {
                AgentError::InvalidResponse("final action missing response field".into())
            })?;
            Ok(AgentDirective::Final {
                response: response.to_string(),
            })
        }
        "call_tool" => {
            let request = parse_call(&map, round, 1)?;
            Ok(AgentDirective::Invoke(vec![request]))
        }
        "call_tools" => {
            let calls = map
                .get("calls")
                .and_then(Value::as_array)
                .filter(|calls| !calls.is_empty())
                .ok_or_else(|| {
                    AgentError::InvalidResponse(
                        "call_tools action needs a non-empty calls array".into(),
                    )
                })?;

            let mut seen = HashSet::new();
            let mut requests = Vec::with_capacity(calls.len());
            for (index, call) in calls.iter().enumerate() {
                let entry = call.as_object().ok_or_else(|| {
                    AgentError::InvalidResponse(format!("call #{} is not an object", index + 1))
                })?;
                let request = parse_call(entry, round, index + 1)?;
                if !seen.insert(request.invocation_id.clone()) {
                    return Err(AgentError::InvalidResponse(format!(
                        "duplicate call id '{}'",
                        request.invocation_id
                    )));
                }
                requests.push(request);
            }
            Ok(AgentDirective::Invoke(requests))
        }
        other => Err(AgentError::InvalidResponse(format!(
            "unknown action value: {other}"
        ))),
    }
}

fn parse_call(
    map: &JsonMap<String, Value>,
    round: usize,
    position: usize,
) -> Result<InvocationRequest, AgentError> {
    let tool = map
        .get("tool")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|tool| !tool.is_empty())
        .ok_or_else(|| AgentError::InvalidResponse("tool call missing tool field".into()))?;
    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => format!("call-{round}-{position}"),
    };
    let input = map.get("input").cloned().unwrap_or(Value::Null);
    Ok(InvocationRequest::new(id, tool, input))
}

/// Pull a JSON value out of a reply that may be fenced or wrapped in prose.
pub fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if trimmed.starts_with("```") {
        let stripped = trimmed.trim_start_matches("```json");
        let stripped = stripped.trim_start_matches("```JSON");
        let stripped = stripped.trim_start_matches("```");
        if let Some(end) = stripped.rfind("```") {
            if let Ok(value) = serde_json::from_str::<Value>(stripped[..end].trim()) {
                return Some(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Some(value);
            }
        }
    }

    None
}
