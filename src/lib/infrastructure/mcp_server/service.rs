use super::catalogue::{
    CREATE_OR_UPDATE_PAGE, CREATE_PAGE, FETCH_ISSUE, SERVER_INSTRUCTIONS, tool_definitions,
};
use super::outcome::ToolOutcome;
use super::{PROTOCOL_VERSION, SERVER_NAME};
use crate::application::formatter::{format_issue, format_success};
use crate::config::AtlassianConfig;
use crate::domain::{ErrorKind, IssueRecord, PageAction, PageDraft, PageRecord, SubtaskEntry};
use crate::infrastructure::atlassian::{
    BackendError, ConfluenceClient, InMemoryAtlassian, IssueTracker, JiraClient, Wiki,
};
use crate::infrastructure::rpc::{RpcRequest, RpcResponse};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map as JsonMap, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

const DEFAULT_MAX_DEPTH: usize = 4;

/// One async lock per `(space_key, title)` being published.
#[derive(Default)]
struct TitleLocks {
    slots: Mutex<HashMap<(String, String), Arc<AsyncMutex<()>>>>,
}

impl TitleLocks {
    async fn acquire(&self, space_key: &str, title: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots
                .entry((space_key.to_string(), title.to_string()))
                .or_default()
                .clone()
        };
        slot.lock_owned().await
    }
}

/// Tool handlers for the Jira/Confluence MCP server.
#[derive(Clone)]
pub struct AtlassianService {
    tracker: Arc<dyn IssueTracker>,
    wiki: Arc<dyn Wiki>,
    max_depth: usize,
    publish_locks: Arc<TitleLocks>,
}

impl AtlassianService {
    pub fn new(tracker: Arc<dyn IssueTracker>, wiki: Arc<dyn Wiki>) -> Self {
        Self {
            tracker,
            wiki,
            max_depth: DEFAULT_MAX_DEPTH,
            publish_locks: Arc::new(TitleLocks::default()),
        }
    }

    pub fn in_memory(store: Arc<InMemoryAtlassian>) -> Self {
        Self::new(store.clone(), store)
    }

    /// Service backed by the Jira and Confluence REST APIs.
    pub fn from_config(config: &AtlassianConfig) -> Self {
        let tracker = JiraClient::new(
            config.jira_base_url.clone(),
            &config.email,
            &config.jira_api_token,
        );
        let wiki = ConfluenceClient::new(
            config.confluence_base_url.clone(),
            &config.email,
            &config.confluence_api_token,
        );
        Self::new(Arc::new(tracker), Arc::new(wiki))
    }

    /// Limit how many levels of child issues are fetched below the root.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn tools(&self) -> Vec<Value> {
        tool_definitions()
    }

    pub fn instructions(&self) -> &'static str {
        SERVER_INSTRUCTIONS
    }

    /// Answer one JSON-RPC message. Notifications yield `None`.
    pub async fn handle_request(&self, request: RpcRequest) -> Option<RpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(RpcResponse::invalid_request(
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        debug!(method = %request.method, "Received MCP request");
        if request.is_notification() {
            debug!(method = %request.method, "Notification acknowledged");
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(id, self.initialize_result()),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, json!({ "tools": self.tools() })),
            "tools/call" => {
                let Some(Value::Object(params)) = request.params else {
                    return Some(RpcResponse::invalid_params(
                        id,
                        "params must be an object with name and arguments",
                    ));
                };
                let Some(name) = params.get("name").and_then(Value::as_str) else {
                    return Some(RpcResponse::invalid_params(id, "params.name must be a string"));
                };
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
                let outcome = self.call_tool(name, &arguments).await;
                RpcResponse::success(id, outcome.into_call_result())
            }
            other => {
                warn!(method = other, "Unknown MCP method");
                RpcResponse::method_not_found(id, other)
            }
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": SERVER_INSTRUCTIONS,
        })
    }

    /// Run a tool by name. Failures come back as error outcomes.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolOutcome {
        info!(tool = name, "Tool call received");
        let empty = JsonMap::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return ToolOutcome::failed(
                    ErrorKind::InvalidArguments,
                    "arguments must be a JSON object",
                );
            }
        };

        let outcome = match name {
            FETCH_ISSUE => self.fetch_issue_tool(args).await,
            CREATE_PAGE => self.create_page_tool(args).await,
            CREATE_OR_UPDATE_PAGE => self.create_or_update_tool(args).await,
            other => ToolOutcome::failed(
                ErrorKind::UnknownOperation,
                format!("tool '{other}' is not provided by this server"),
            ),
        };
        info!(tool = name, is_error = outcome.is_error(), "Tool call finished");
        outcome
    }

    async fn fetch_issue_tool(&self, args: &JsonMap<String, Value>) -> ToolOutcome {
        let issue_key = match required_strings(args, &["issue_key"]) {
            Ok(values) => values[0].clone(),
            Err(outcome) => return outcome,
        };
        match self.fetch_issue_tree(&issue_key).await {
            Ok(issue) => {
                let structured = serde_json::to_value(&issue).unwrap_or(Value::Null);
                ToolOutcome::ok(format_issue(&issue), json!({ "issue": structured }))
            }
            Err(err) => backend_failure(&err),
        }
    }

    async fn create_page_tool(&self, args: &JsonMap<String, Value>) -> ToolOutcome {
        let draft = match required_strings(args, &["space_key", "title", "body"]) {
            Ok(values) => PageDraft {
                space_key: values[0].clone(),
                title: values[1].clone(),
                body: values[2].clone(),
            },
            Err(outcome) => return outcome,
        };
        match self.wiki.create_page(&draft).await {
            Ok(page) => page_outcome(page, PageAction::Created),
            Err(err) => backend_failure(&err),
        }
    }

    async fn create_or_update_tool(&self, args: &JsonMap<String, Value>) -> ToolOutcome {
        let (issue_key, draft) =
            match required_strings(args, &["issue_key", "space_key", "title", "body"]) {
                Ok(values) => (
                    values[0].clone(),
                    PageDraft {
                        space_key: values[1].clone(),
                        title: values[2].clone(),
                        body: values[3].clone(),
                    },
                ),
                Err(outcome) => return outcome,
            };

        match self.publish_for_issue(&issue_key, &draft).await {
            Ok((page, action)) => page_outcome(page, action),
            Err(err) => backend_failure(&err),
        }
    }

    /// Create or update the page titled `draft.title` in `draft.space_key`.
    ///
    /// The title lookup always runs before any write, so repeating the call
    /// updates the same page. Publishes to the same space and title are
    /// serialized from lookup to write. More than one existing match is
    /// reported as a conflict and nothing is written.
    pub async fn publish_for_issue(
        &self,
        issue_key: &str,
        draft: &PageDraft,
    ) -> Result<(PageRecord, PageAction), BackendError> {
        let issue = self.tracker.fetch_issue(issue_key).await?;
        debug!(
            issue = %issue.key,
            summary = %issue.summary,
            body_len = draft.body.len(),
            "Validated Jira issue for page publish"
        );

        let _guard = self
            .publish_locks
            .acquire(&draft.space_key, &draft.title)
            .await;
        let existing = self.wiki.find_pages(&draft.space_key, &draft.title).await?;
        match existing.as_slice() {
            [] => {
                info!(space = %draft.space_key, title = %draft.title, "Creating new page");
                let page = self.wiki.create_page(draft).await?;
                Ok((page, PageAction::Created))
            }
            [page] => {
                info!(page = %page.id, version = page.version, "Updating existing page");
                let updated = self.wiki.update_page(page, draft).await?;
                Ok((updated, PageAction::Updated))
            }
            many => {
                warn!(
                    space = %draft.space_key,
                    title = %draft.title,
                    matches = many.len(),
                    "Ambiguous page title"
                );
                Err(BackendError::Conflict {
                    space_key: draft.space_key.clone(),
                    title: draft.title.clone(),
                    count: many.len(),
                })
            }
        }
    }

    /// Fetch an issue and its children down to the configured depth.
    pub async fn fetch_issue_tree(&self, key: &str) -> Result<IssueRecord, BackendError> {
        let mut visited = HashSet::new();
        visited.insert(key.to_string());
        self.load_tree(key.to_string(), 0, &mut visited).await
    }

    fn load_tree<'a>(
        &'a self,
        key: String,
        depth: usize,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<IssueRecord, BackendError>> {
        async move {
            let snapshot = self.tracker.fetch_issue(&key).await?;
            let mut subtasks = Vec::with_capacity(snapshot.subtask_keys.len());

            for child in &snapshot.subtask_keys {
                if !visited.insert(child.clone()) {
                    subtasks.push(SubtaskEntry::Unresolved {
                        key: child.clone(),
                        reason: "already listed".to_string(),
                    });
                    continue;
                }
                if depth + 1 > self.max_depth {
                    subtasks.push(SubtaskEntry::Unresolved {
                        key: child.clone(),
                        reason: "nesting limit reached".to_string(),
                    });
                    continue;
                }
                match self.load_tree(child.clone(), depth + 1, &mut *visited).await {
                    Ok(record) => subtasks.push(SubtaskEntry::Resolved(record)),
                    Err(err) => {
                        warn!(parent = %snapshot.key, child = %child, %err, "Subtask fetch failed");
                        subtasks.push(SubtaskEntry::Unresolved {
                            key: child.clone(),
                            reason: format!("Unable to fetch subtask details ({err})"),
                        });
                    }
                }
            }

            Ok(IssueRecord {
                key: snapshot.key,
                summary: snapshot.summary,
                status: snapshot.status,
                reporter: snapshot.reporter,
                description: snapshot.description,
                subtasks,
            })
        }
        .boxed()
    }
}

fn required_strings(
    args: &JsonMap<String, Value>,
    names: &[&str],
) -> Result<Vec<String>, ToolOutcome> {
    let mut values = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match args.get(*name).and_then(Value::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => values.push(value.to_string()),
            _ => missing.push(*name),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(ToolOutcome::failed(
            ErrorKind::InvalidArguments,
            format!("missing or empty required fields: {}", missing.join(", ")),
        ))
    }
}

fn page_outcome(page: PageRecord, action: PageAction) -> ToolOutcome {
    let text = format_success(&page, action);
    let structured = json!({
        "page": {
            "id": page.id,
            "space_key": page.space_key,
            "title": page.title,
            "version": page.version,
            "url": page.url,
        },
        "action": action.as_str(),
    });
    ToolOutcome::ok(text, structured)
}

fn backend_failure(err: &BackendError) -> ToolOutcome {
    ToolOutcome::failed(err.kind(), err.to_string())
}
