//! Jira REST client

use super::adf::{extract_description, extract_field};
use super::error::BackendError;
use super::http::AtlassianHttp;
use super::ident;
use super::{IssueSnapshot, IssueTracker};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

#[derive(Clone)]
pub struct JiraClient {
    http: AtlassianHttp,
}

impl JiraClient {
    pub fn new(base_url: impl Into<String>, email: &str, api_token: &str) -> Self {
        Self {
            http: AtlassianHttp::new("jira", base_url, email, api_token),
        }
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, key: &str) -> Result<IssueSnapshot, BackendError> {
        let key = ident::issue_key(key)?;
        info!(issue = key, "Fetching Jira issue");
        let path = format!("/rest/api/3/issue/{key}");
        let data: Value = self
            .http
            .get_json(&path, &[], &format!("issue {key}"))
            .await?;
        Ok(snapshot_from_json(key, &data))
    }
}

fn snapshot_from_json(key: &str, data: &Value) -> IssueSnapshot {
    let fields = data.get("fields").cloned().unwrap_or(Value::Null);
    let subtask_keys = fields
        .get("subtasks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|sub| sub.get("key").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    IssueSnapshot {
        key: data
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or(key)
            .to_string(),
        summary: fields
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("No summary")
            .to_string(),
        status: extract_field(fields.get("status"), "name"),
        reporter: extract_field(fields.get("reporter"), "displayName"),
        assignee: extract_field(fields.get("assignee"), "displayName"),
        priority: extract_field(fields.get("priority"), "name"),
        issue_type: extract_field(fields.get("issuetype"), "name"),
        description: extract_description(fields.get("description")),
        subtask_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_reads_nested_fields() {
        let data = json!({
            "key": "PROJ-1",
            "fields": {
                "summary": "Login",
                "status": {"name": "Open"},
                "reporter": {"displayName": "Ana"},
                "assignee": null,
                "subtasks": [{"key": "PROJ-2"}, {"id": "no-key"}, {"key": "PROJ-3"}]
            }
        });
        let snapshot = snapshot_from_json("PROJ-1", &data);
        assert_eq!(snapshot.status, "Open");
        assert_eq!(snapshot.reporter, "Ana");
        assert_eq!(snapshot.assignee, "Unknown");
        assert_eq!(snapshot.description, "No description available");
        assert_eq!(snapshot.subtask_keys, vec!["PROJ-2", "PROJ-3"]);
    }
}
