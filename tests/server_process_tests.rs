// Sessions over a spawned `atlassian-server --offline` child process
//
// Exercises the real stdio transport: handshake, discovery, tool calls and
// shutdown.

use atlassian_mcp_bridge::agent::AgentError;
use atlassian_mcp_bridge::config::ServerConfig;
use atlassian_mcp_bridge::domain::{ErrorKind, InvocationRequest};
use atlassian_mcp_bridge::session::{BackendLocator, SessionManager};
use atlassian_mcp_bridge::tooling::ToolInvokeError;
use serde_json::json;
use std::time::Duration;

fn offline_server() -> BackendLocator {
    let server = ServerConfig::new("atlassian", env!("CARGO_BIN_EXE_atlassian-server"))
        .with_args(vec!["--offline".to_string()]);
    BackendLocator::Process(server)
}

fn sessions() -> SessionManager {
    SessionManager::new(Duration::from_secs(20), Duration::from_secs(20))
}

#[tokio::test]
async fn spawned_server_advertises_tools_and_answers_calls() {
    let session = sessions().open(&offline_server()).await.expect("session");
    assert_eq!(session.server_name(), "atlassian");
    assert_eq!(session.registry().len(), 3);

    let missing = session
        .executor()
        .execute(&InvocationRequest::new(
            "1",
            "get_jira_ticket",
            json!({"issue_key": "PROJ-404"}),
        ))
        .await;
    assert_eq!(missing.error_kind, Some(ErrorKind::NotFound));
    assert!(session.is_alive());

    let batch = vec![
        InvocationRequest::new(
            "2",
            "create_confluence_page",
            json!({"space_key": "DOC", "title": "Test Plan A", "body": "<p>v1</p>"}),
        ),
        InvocationRequest::new("3", "get_jira_ticket", json!({"issue_key": "PROJ-405"})),
    ];
    let results = session.executor().execute_all(&batch, true).await;
    assert_eq!(results[0].invocation_id, "2");
    assert!(results[0].is_success(), "{}", results[0].payload);
    assert!(results[0].payload.contains("/spaces/DOC/"));
    assert_eq!(results[1].error_kind, Some(ErrorKind::NotFound));

    session.close().await;
}

#[tokio::test]
async fn missing_server_binary_fails_to_open() {
    let locator = BackendLocator::Process(ServerConfig::new(
        "ghost",
        "/nonexistent/atlassian-server",
    ));

    let err = sessions()
        .open(&locator)
        .await
        .err()
        .expect("spawn failure");
    assert!(matches!(
        err,
        AgentError::Connection(ToolInvokeError::Spawn { .. })
    ));
}
