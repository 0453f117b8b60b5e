// End-to-end tool scenarios against the in-memory Atlassian store
//
// Sessions are opened with the in-process locator, so every call goes through
// the MCP JSON-RPC handler, the capability registry, and the executor.

use async_trait::async_trait;
use atlassian_mcp_bridge::agent::{AgentError, AgentOptions};
use atlassian_mcp_bridge::atlassian::{BackendError, InMemoryAtlassian, IssueSnapshot, Wiki};
use atlassian_mcp_bridge::bridge::Bridge;
use atlassian_mcp_bridge::domain::{ErrorKind, InvocationRequest, PageDraft, PageRecord, PageRef};
use atlassian_mcp_bridge::mcp_server::AtlassianService;
use atlassian_mcp_bridge::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use atlassian_mcp_bridge::session::{BackendLocator, Session, SessionManager};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn issue(key: &str, summary: &str, status: &str, subtasks: &[&str]) -> IssueSnapshot {
    IssueSnapshot {
        key: key.into(),
        summary: summary.into(),
        status: status.into(),
        reporter: "Dana Reyes".into(),
        assignee: "Unknown".into(),
        priority: "Medium".into(),
        issue_type: "Story".into(),
        description: format!("Description of {key}"),
        subtask_keys: subtasks.iter().map(|key| key.to_string()).collect(),
    }
}

fn seeded_store() -> Arc<InMemoryAtlassian> {
    let store = Arc::new(InMemoryAtlassian::default());
    store.insert_issue(issue(
        "PROJ-123",
        "Checkout flow",
        "In Progress",
        &["PROJ-124", "PROJ-125"],
    ));
    store.insert_issue(issue("PROJ-124", "Card form", "Done", &[]));
    store.insert_issue(issue("PROJ-125", "Receipt email", "To Do", &[]));
    store
}

async fn open_session(store: &Arc<InMemoryAtlassian>) -> Session {
    let locator = BackendLocator::InProcess(AtlassianService::in_memory(store.clone()));
    SessionManager::default()
        .open(&locator)
        .await
        .expect("in-process session")
}

fn request(id: &str, operation: &str, arguments: serde_json::Value) -> InvocationRequest {
    InvocationRequest::new(id, operation, arguments)
}

#[tokio::test]
async fn registry_lists_the_three_atlassian_operations() {
    let store = seeded_store();
    let session = open_session(&store).await;
    assert_eq!(
        session.registry().names(),
        vec![
            "get_jira_ticket",
            "create_confluence_page",
            "create_test_plan_from_jira"
        ]
    );
    assert!(session.registry().instructions().is_some());
    session.close().await;
}

#[tokio::test]
async fn fetch_issue_reports_status_reporter_description_and_subtasks_in_order() {
    let store = seeded_store();
    let session = open_session(&store).await;

    let result = session
        .executor()
        .execute(&request("a", "get_jira_ticket", json!({"issue_key": "PROJ-123"})))
        .await;

    assert!(result.is_success(), "{}", result.payload);
    let report = &result.payload;
    assert!(report.contains("Status: In Progress"));
    assert!(report.contains("Reporter: Dana Reyes"));
    assert!(report.contains("Description: Description of PROJ-123"));

    let first = report.find("- PROJ-124: Card form | Status: Done").expect("first subtask");
    let second = report
        .find("- PROJ-125: Receipt email | Status: To Do")
        .expect("second subtask");
    assert!(first < second);
    session.close().await;
}

#[tokio::test]
async fn create_then_create_or_update_keeps_one_page_and_one_url() {
    let store = seeded_store();
    let session = open_session(&store).await;

    let created = session
        .executor()
        .execute(&request(
            "b",
            "create_confluence_page",
            json!({"space_key": "DOC", "title": "Test Plan A", "body": "<p>v1</p>"}),
        ))
        .await;
    assert!(created.is_success(), "{}", created.payload);
    assert!(created.payload.contains("/spaces/DOC/"));
    let url = created.data["page"]["url"].as_str().expect("url").to_string();
    assert!(created.payload.contains(&url));

    let updated = session
        .executor()
        .execute(&request(
            "c",
            "create_test_plan_from_jira",
            json!({
                "issue_key": "PROJ-123",
                "space_key": "DOC",
                "title": "Test Plan A",
                "body": "<p>v2</p>"
            }),
        ))
        .await;
    assert!(updated.is_success(), "{}", updated.payload);
    assert!(updated.payload.contains(&url));

    let pages = store.pages_titled("DOC", "Test Plan A");
    assert_eq!(pages.len(), 1);
    let page = store.get_page(&pages[0].id).await.expect("page");
    assert_eq!(page.body, "<p>v2</p>");
    assert_eq!(page.version, 2);
    session.close().await;
}

#[tokio::test]
async fn create_or_update_twice_leaves_a_single_page() {
    let store = seeded_store();
    let session = open_session(&store).await;
    let publish = request(
        "p",
        "create_test_plan_from_jira",
        json!({
            "issue_key": "PROJ-123",
            "space_key": "QA",
            "title": "Checkout test plan",
            "body": "<p>plan</p>"
        }),
    );

    let first = session.executor().execute(&publish).await;
    let second = session.executor().execute(&publish).await;

    assert!(first.is_success() && second.is_success());
    assert_eq!(first.data["page"]["url"], second.data["page"]["url"]);
    assert_eq!(store.pages_titled("QA", "Checkout test plan").len(), 1);
    session.close().await;
}

#[tokio::test]
async fn missing_issue_is_not_found_and_session_stays_open() {
    let store = seeded_store();
    let session = open_session(&store).await;

    let missing = session
        .executor()
        .execute(&request("d", "get_jira_ticket", json!({"issue_key": "NOPE-1"})))
        .await;
    assert!(!missing.is_success());
    assert_eq!(missing.error_kind, Some(ErrorKind::NotFound));
    assert!(missing.payload.starts_with("Error (not_found)"));
    assert!(session.is_alive());

    let next = session
        .executor()
        .execute(&request("e", "get_jira_ticket", json!({"issue_key": "PROJ-124"})))
        .await;
    assert!(next.is_success());
    session.close().await;
}

#[tokio::test]
async fn invalid_or_unknown_requests_never_reach_the_wiki() {
    let store = seeded_store();
    let session = open_session(&store).await;

    let unknown = session
        .executor()
        .execute(&request("u", "delete_everything", json!({})))
        .await;
    assert_eq!(unknown.error_kind, Some(ErrorKind::UnknownOperation));

    let invalid = session
        .executor()
        .execute(&request(
            "i",
            "create_confluence_page",
            json!({"space_key": "DOC", "body": "<p>x</p>"}),
        ))
        .await;
    assert_eq!(invalid.error_kind, Some(ErrorKind::InvalidArguments));
    assert!(invalid.payload.contains("title"));
    assert!(store.pages_titled("DOC", "").is_empty());
    session.close().await;
}

#[tokio::test]
async fn duplicate_titles_are_a_conflict_and_nothing_is_written() {
    let store = seeded_store();
    for body in ["<p>one</p>", "<p>two</p>"] {
        store.seed_page(&PageDraft {
            space_key: "DOC".into(),
            title: "Shared".into(),
            body: body.into(),
        });
    }
    let session = open_session(&store).await;

    let result = session
        .executor()
        .execute(&request(
            "c",
            "create_test_plan_from_jira",
            json!({"issue_key": "PROJ-123", "space_key": "DOC", "title": "Shared", "body": "<p>new</p>"}),
        ))
        .await;

    assert_eq!(result.error_kind, Some(ErrorKind::Conflict));
    let pages = store.pages_titled("DOC", "Shared");
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|page| page.version == 1));
    session.close().await;
}

#[tokio::test]
async fn denied_space_is_permission_denied() {
    let store = seeded_store();
    store.deny_space("SECRET");
    let session = open_session(&store).await;

    let result = session
        .executor()
        .execute(&request(
            "s",
            "create_confluence_page",
            json!({"space_key": "SECRET", "title": "Plan", "body": "<p>x</p>"}),
        ))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::PermissionDenied));
    session.close().await;
}

#[tokio::test]
async fn parallel_batch_returns_results_in_request_order() {
    let store = seeded_store();
    let session = open_session(&store).await;
    let batch = vec![
        request("1", "get_jira_ticket", json!({"issue_key": "PROJ-125"})),
        request("2", "get_jira_ticket", json!({"issue_key": "NOPE-9"})),
        request("3", "get_jira_ticket", json!({"issue_key": "PROJ-124"})),
    ];

    let results = session.executor().execute_all(&batch, true).await;

    let ids: Vec<_> = results.iter().map(|r| r.invocation_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(results[0].is_success());
    assert_eq!(results[1].error_kind, Some(ErrorKind::NotFound));
    assert!(results[2].payload.contains("PROJ-124"));
    session.close().await;
}

/// Wiki with a fixed delay on every write path call.
struct SlowWiki {
    store: Arc<InMemoryAtlassian>,
    delay: Duration,
}

#[async_trait]
impl Wiki for SlowWiki {
    async fn find_pages(&self, space_key: &str, title: &str) -> Result<Vec<PageRef>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.store.find_pages(space_key, title).await
    }

    async fn create_page(&self, draft: &PageDraft) -> Result<PageRecord, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.store.create_page(draft).await
    }

    async fn update_page(
        &self,
        existing: &PageRef,
        draft: &PageDraft,
    ) -> Result<PageRecord, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.store.update_page(existing, draft).await
    }

    async fn get_page(&self, page_id: &str) -> Result<PageRecord, BackendError> {
        self.store.get_page(page_id).await
    }
}

#[tokio::test]
async fn same_title_publishes_in_one_parallel_turn_keep_a_single_page() {
    let store = seeded_store();
    let wiki = Arc::new(SlowWiki {
        store: store.clone(),
        delay: Duration::from_millis(20),
    });
    let locator = BackendLocator::InProcess(AtlassianService::new(store.clone(), wiki));
    let session = SessionManager::default()
        .open(&locator)
        .await
        .expect("in-process session");
    let publish = |id: &str, body: &str| {
        request(
            id,
            "create_test_plan_from_jira",
            json!({"issue_key": "PROJ-123", "space_key": "DOC", "title": "Plan", "body": body}),
        )
    };

    let results = session
        .executor()
        .execute_all(&[publish("a", "<p>a</p>"), publish("b", "<p>b</p>")], true)
        .await;

    assert!(results.iter().all(|r| r.is_success()), "{results:?}");
    assert_eq!(results[0].data["page"]["url"], results[1].data["page"]["url"]);
    let pages = store.pages_titled("DOC", "Plan");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].version, 2);
    session.close().await;
}

/// Model stand-in that replays canned replies and records every request.
struct ScriptedModel {
    replies: Mutex<Vec<String>>,
    seen: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.seen.lock().expect("seen lock").push(request);
        let mut replies = self.replies.lock().expect("replies lock");
        let reply = if replies.len() > 1 {
            replies.pop()
        } else {
            replies.last().cloned()
        };
        Ok(ModelResponse::new(reply.unwrap_or_default()))
    }
}

#[tokio::test]
async fn bridge_publishes_a_test_plan_from_a_fetched_issue() {
    let store = seeded_store();
    let model = ScriptedModel::new(&[
        r#"{"action":"call_tool","tool":"get_jira_ticket","input":{"issue_key":"PROJ-123"}}"#,
        r#"{"action":"call_tool","tool":"create_test_plan_from_jira","input":{"issue_key":"PROJ-123","space_key":"QA","title":"PROJ-123 test plan","body":"<p>cases</p>"}}"#,
        r#"{"action":"final","response":"Published the PROJ-123 test plan."}"#,
    ]);
    let bridge = Bridge::new(
        model.clone(),
        AgentOptions::new("scripted", "test-model"),
        SessionManager::default(),
    );
    let locator = BackendLocator::InProcess(AtlassianService::in_memory(store.clone()));

    let outcome = bridge
        .run("Write a test plan for PROJ-123 in QA", &locator)
        .await
        .expect("bridge run");

    assert_eq!(outcome.response, "Published the PROJ-123 test plan.");
    assert_eq!(outcome.steps.len(), 2);
    assert!(outcome.steps.iter().all(|step| step.result.is_success()));
    assert_eq!(store.pages_titled("QA", "PROJ-123 test plan").len(), 1);

    let seen = model.seen.lock().expect("seen lock");
    assert_eq!(seen.len(), 3);
    let last = seen[2].messages.last().expect("tool results message");
    assert!(last.content.contains("Page created successfully"));
}

#[tokio::test]
async fn bridge_stops_a_model_that_never_answers() {
    let store = seeded_store();
    let model = ScriptedModel::new(&[
        r#"{"action":"call_tool","tool":"get_jira_ticket","input":{"issue_key":"PROJ-124"}}"#,
    ]);
    let bridge = Bridge::new(
        model,
        AgentOptions::new("scripted", "test-model").with_max_turns(2),
        SessionManager::default(),
    );
    let locator = BackendLocator::InProcess(AtlassianService::in_memory(store));

    let err = bridge
        .run("Loop forever", &locator)
        .await
        .expect_err("turn limit");
    assert!(matches!(err, AgentError::TurnLimitExceeded { limit: 2 }));
}
