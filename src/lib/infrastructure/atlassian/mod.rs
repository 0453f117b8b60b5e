//! Atlassian backends
//!
//! Thin request/response wrappers around the Jira and Confluence REST APIs,
//! plus an in-memory implementation of the same traits for offline runs.
//!
//! # Structure
//! - `error` - `BackendError` and its mapping onto invocation error kinds
//! - `http` - shared authenticated HTTP plumbing
//! - `ident` - issue key and page id checks for REST paths
//! - `adf` - helpers for Jira's rich-text and object fields
//! - `jira` / `confluence` - REST clients
//! - `memory` - `InMemoryAtlassian`

mod adf;
mod confluence;
mod error;
mod http;
mod ident;
mod jira;
mod memory;

pub use adf::{extract_description, extract_field};
pub use confluence::ConfluenceClient;
pub use error::BackendError;
pub use http::AtlassianHttp;
pub use jira::JiraClient;
pub use memory::InMemoryAtlassian;

use crate::domain::{PageDraft, PageRecord, PageRef};
use async_trait::async_trait;

/// Flat view of a single issue as returned by the tracker, children unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub reporter: String,
    pub assignee: String,
    pub priority: String,
    pub issue_type: String,
    pub description: String,
    pub subtask_keys: Vec<String>,
}

/// Read access to the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_issue(&self, key: &str) -> Result<IssueSnapshot, BackendError>;
}

/// Write access to the wiki.
#[async_trait]
pub trait Wiki: Send + Sync {
    /// Every page in `space_key` whose title matches exactly.
    async fn find_pages(&self, space_key: &str, title: &str) -> Result<Vec<PageRef>, BackendError>;

    async fn create_page(&self, draft: &PageDraft) -> Result<PageRecord, BackendError>;

    /// Replace the body of `existing`, bumping its version.
    async fn update_page(
        &self,
        existing: &PageRef,
        draft: &PageDraft,
    ) -> Result<PageRecord, BackendError>;

    async fn get_page(&self, page_id: &str) -> Result<PageRecord, BackendError>;
}
