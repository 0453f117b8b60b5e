//! Helpers for Jira field payloads

use serde_json::Value;

const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN: &str = "Unknown";

/// Flatten a Jira description into plain text.
///
/// API v3 returns descriptions as Atlassian Document Format; only text nodes
/// inside top-level paragraphs are kept, joined by single spaces. Plain
/// string descriptions (API v2) pass through unchanged.
pub fn extract_description(field: Option<&Value>) -> String {
    let Some(field) = field else {
        return NO_DESCRIPTION.to_string();
    };

    if let Some(text) = field.as_str() {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            trimmed.to_string()
        };
    }

    let parts: Vec<&str> = field
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|node| node.get("type").and_then(Value::as_str) == Some("paragraph"))
        .flat_map(|paragraph| {
            paragraph
                .get("content")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
        })
        .filter(|node| node.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|node| node.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        parts.join(" ")
    }
}

/// Read `name` out of an object-valued field such as `status` or `reporter`.
pub fn extract_field(field: Option<&Value>, name: &str) -> String {
    match field {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::Object(map)) => map
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_string(),
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::String(_)) => UNKNOWN.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_paragraph_text_nodes() {
        let adf = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "First"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "second."}
                ]},
                {"type": "codeBlock", "content": [{"type": "text", "text": "skipped"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "Third"}]}
            ]
        });
        assert_eq!(extract_description(Some(&adf)), "First second. Third");
    }

    #[test]
    fn missing_or_empty_description_uses_placeholder() {
        assert_eq!(extract_description(None), NO_DESCRIPTION);
        assert_eq!(extract_description(Some(&json!({"content": []}))), NO_DESCRIPTION);
        assert_eq!(extract_description(Some(&json!("   "))), NO_DESCRIPTION);
    }

    #[test]
    fn object_fields_fall_back_to_unknown() {
        assert_eq!(extract_field(Some(&json!({"name": "Done"})), "name"), "Done");
        assert_eq!(extract_field(Some(&json!({"id": "1"})), "name"), UNKNOWN);
        assert_eq!(extract_field(Some(&Value::Null), "displayName"), UNKNOWN);
    }
}
