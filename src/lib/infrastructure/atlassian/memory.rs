//! In-memory Atlassian backend
//!
//! Implements both [`IssueTracker`] and [`Wiki`] over process-local maps.
//! Used by `atlassian-server --offline` and by the test suites.

use super::error::BackendError;
use super::{IssueSnapshot, IssueTracker, Wiki};
use crate::domain::{PageDraft, PageRecord, PageRef};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_WIKI_URL: &str = "https://wiki.local.test/wiki";

pub struct InMemoryAtlassian {
    base_url: String,
    issues: Mutex<HashMap<String, IssueSnapshot>>,
    pages: Mutex<Vec<PageRecord>>,
    denied_spaces: Mutex<HashSet<String>>,
    next_page_id: AtomicU64,
}

impl Default for InMemoryAtlassian {
    fn default() -> Self {
        Self::new(DEFAULT_WIKI_URL)
    }
}

impl InMemoryAtlassian {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            issues: Mutex::new(HashMap::new()),
            pages: Mutex::new(Vec::new()),
            denied_spaces: Mutex::new(HashSet::new()),
            next_page_id: AtomicU64::new(1000),
        }
    }

    pub fn insert_issue(&self, issue: IssueSnapshot) {
        self.issues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(issue.key.clone(), issue);
    }

    /// Reject every write into `space_key` with a permission error.
    pub fn deny_space(&self, space_key: impl Into<String>) {
        self.denied_spaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(space_key.into());
    }

    /// Store a page directly, bypassing the title lookup.
    pub fn seed_page(&self, draft: &PageDraft) -> PageRecord {
        let record = self.new_record(draft);
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        record
    }

    pub fn pages_titled(&self, space_key: &str, title: &str) -> Vec<PageRecord> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|page| page.space_key == space_key && page.title == title)
            .cloned()
            .collect()
    }

    fn new_record(&self, draft: &PageDraft) -> PageRecord {
        let id = self.next_page_id.fetch_add(1, Ordering::SeqCst).to_string();
        let url = format!(
            "{}/spaces/{}/pages/{}",
            self.base_url.trim_end_matches('/'),
            draft.space_key,
            id
        );
        PageRecord {
            id,
            space_key: draft.space_key.clone(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            version: 1,
            url,
        }
    }

    fn ensure_writable(&self, space_key: &str) -> Result<(), BackendError> {
        if self
            .denied_spaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(space_key)
        {
            return Err(BackendError::PermissionDenied {
                service: "confluence".to_string(),
                message: format!("no write permission for space {space_key}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for InMemoryAtlassian {
    async fn fetch_issue(&self, key: &str) -> Result<IssueSnapshot, BackendError> {
        self.issues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("issue {key}")))
    }
}

#[async_trait]
impl Wiki for InMemoryAtlassian {
    async fn find_pages(&self, space_key: &str, title: &str) -> Result<Vec<PageRef>, BackendError> {
        Ok(self
            .pages_titled(space_key, title)
            .into_iter()
            .map(|page| PageRef {
                id: page.id,
                title: page.title,
                version: page.version,
            })
            .collect())
    }

    async fn create_page(&self, draft: &PageDraft) -> Result<PageRecord, BackendError> {
        self.ensure_writable(&draft.space_key)?;
        Ok(self.seed_page(draft))
    }

    async fn update_page(
        &self,
        existing: &PageRef,
        draft: &PageDraft,
    ) -> Result<PageRecord, BackendError> {
        self.ensure_writable(&draft.space_key)?;
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        let page = pages
            .iter_mut()
            .find(|page| page.id == existing.id)
            .ok_or_else(|| BackendError::not_found(format!("page {}", existing.id)))?;
        page.title = draft.title.clone();
        page.body = draft.body.clone();
        page.version += 1;
        Ok(page.clone())
    }

    async fn get_page(&self, page_id: &str) -> Result<PageRecord, BackendError> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|page| page.id == page_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("page {page_id}")))
    }
}
