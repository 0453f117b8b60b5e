//! Confluence REST client

use super::error::BackendError;
use super::http::AtlassianHttp;
use super::ident;
use super::Wiki;
use crate::domain::{PageDraft, PageRecord, PageRef};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

const CONTENT_PATH: &str = "/rest/api/content";

#[derive(Clone)]
pub struct ConfluenceClient {
    http: AtlassianHttp,
}

impl ConfluenceClient {
    pub fn new(base_url: impl Into<String>, email: &str, api_token: &str) -> Self {
        Self {
            http: AtlassianHttp::new("confluence", base_url, email, api_token),
        }
    }

    fn page_payload(draft: &PageDraft) -> Value {
        json!({
            "type": "page",
            "title": draft.title,
            "space": { "key": draft.space_key },
            "body": {
                "storage": {
                    "value": draft.body,
                    "representation": "storage"
                }
            }
        })
    }

    fn record_from_json(&self, data: &Value, fallback: Option<&PageDraft>) -> Result<PageRecord, BackendError> {
        let id = match data.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(BackendError::invalid_response(
                    &self.http.service,
                    "page payload missing id",
                ));
            }
        };

        let links = data.get("_links");
        let base = links
            .and_then(|l| l.get("base"))
            .and_then(Value::as_str)
            .unwrap_or(self.http.base_url.as_str());
        let webui = links
            .and_then(|l| l.get("webui"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let text = |value: Option<&Value>, fallback: Option<&str>| -> String {
            value
                .and_then(Value::as_str)
                .or(fallback)
                .unwrap_or_default()
                .to_string()
        };

        Ok(PageRecord {
            id,
            space_key: text(
                data.pointer("/space/key"),
                fallback.map(|d| d.space_key.as_str()),
            ),
            title: text(data.get("title"), fallback.map(|d| d.title.as_str())),
            body: text(
                data.pointer("/body/storage/value"),
                fallback.map(|d| d.body.as_str()),
            ),
            version: data
                .pointer("/version/number")
                .and_then(Value::as_u64)
                .unwrap_or(1),
            url: format!("{base}{webui}"),
        })
    }
}

#[async_trait]
impl Wiki for ConfluenceClient {
    async fn find_pages(&self, space_key: &str, title: &str) -> Result<Vec<PageRef>, BackendError> {
        let data: Value = self
            .http
            .get_json(
                CONTENT_PATH,
                &[("title", title), ("spaceKey", space_key), ("expand", "version")],
                &format!("space {space_key}"),
            )
            .await?;

        let pages = data
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|page| {
                let id = page.get("id").and_then(Value::as_str)?;
                Some(PageRef {
                    id: id.to_string(),
                    title: page
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(title)
                        .to_string(),
                    version: page
                        .pointer("/version/number")
                        .and_then(Value::as_u64)
                        .unwrap_or(1),
                })
            })
            .collect();
        Ok(pages)
    }

    async fn create_page(&self, draft: &PageDraft) -> Result<PageRecord, BackendError> {
        info!(space = %draft.space_key, title = %draft.title, "Creating Confluence page");
        let payload = Self::page_payload(draft);
        let data: Value = self
            .http
            .post_json(
                &format!("{CONTENT_PATH}/"),
                &payload,
                &format!("space {}", draft.space_key),
            )
            .await?;
        self.record_from_json(&data, Some(draft))
    }

    async fn update_page(
        &self,
        existing: &PageRef,
        draft: &PageDraft,
    ) -> Result<PageRecord, BackendError> {
        let page_id = ident::page_id(&existing.id)?;
        info!(
            page = %existing.id,
            version = existing.version,
            "Updating Confluence page"
        );
        let mut payload = Self::page_payload(draft);
        if let Some(map) = payload.as_object_mut() {
            map.insert("id".to_string(), Value::String(existing.id.clone()));
            map.insert("version".to_string(), json!({ "number": existing.version + 1 }));
        }
        let data: Value = self
            .http
            .put_json(
                &format!("{CONTENT_PATH}/{page_id}"),
                &payload,
                &format!("page {page_id}"),
            )
            .await?;
        self.record_from_json(&data, Some(draft))
    }

    async fn get_page(&self, page_id: &str) -> Result<PageRecord, BackendError> {
        let page_id = ident::page_id(page_id)?;
        let data: Value = self
            .http
            .get_json(
                &format!("{CONTENT_PATH}/{page_id}"),
                &[("expand", "body.storage,version,space")],
                &format!("page {page_id}"),
            )
            .await?;
        self.record_from_json(&data, None)
    }
}
