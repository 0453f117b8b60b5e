use serde::{Deserialize, Serialize};

/// A Jira issue as seen by the bridge, with its children already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub reporter: String,
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<SubtaskEntry>,
}

/// A child story or subtask. Children that fail to load are kept in place so
/// the report still lists them in their original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubtaskEntry {
    Resolved(IssueRecord),
    Unresolved { key: String, reason: String },
}

impl SubtaskEntry {
    pub fn key(&self) -> &str {
        match self {
            SubtaskEntry::Resolved(record) => &record.key,
            SubtaskEntry::Unresolved { key, .. } => key,
        }
    }
}
