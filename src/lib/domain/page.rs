use serde::{Deserialize, Serialize};

/// Content to publish to a wiki space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDraft {
    pub space_key: String,
    pub title: String,
    pub body: String,
}

/// Lightweight handle returned by a title lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub title: String,
    pub version: u64,
}

/// A page as stored by the wiki after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub space_key: String,
    pub title: String,
    pub body: String,
    pub version: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAction {
    Created,
    Updated,
}

impl PageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PageAction::Created => "created",
            PageAction::Updated => "updated",
        }
    }
}
