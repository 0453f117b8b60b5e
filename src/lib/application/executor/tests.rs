use super::*;
use crate::domain::InvocationStatus;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

/// Connection whose behaviour is driven by the `issue_key` argument.
struct StubConnection {
    calls: Mutex<Vec<Value>>,
}

impl StubConnection {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl ToolServerInterface for StubConnection {
    fn name(&self) -> &str {
        "stub"
    }

    async fn connect(&self) -> Result<(), ToolInvokeError> {
        Ok(())
    }

    async fn list_tools(&self) -> Result<Value, ToolInvokeError> {
        Ok(listing())
    }

    async fn call_tool(&self, _tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(arguments.clone());
        if let Some(delay) = arguments.get("delay_ms").and_then(Value::as_u64) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let key = arguments["issue_key"].as_str().unwrap_or_default().to_string();
        match key.as_str() {
            "DROP-1" => Err(ToolInvokeError::Terminated {
                server: "stub".into(),
            }),
            "RPC-1" => Err(ToolInvokeError::Rpc {
                server: "stub".into(),
                code: INVALID_PARAMS,
                message: "bad params".into(),
            }),
            "NOPE-1" => Ok(json!({
                "content": [{"type": "text", "text": "Error (not_found): issue NOPE-1 not found"}],
                "isError": true,
                "structuredContent": {"error": {"kind": "not_found", "message": "issue NOPE-1 not found"}}
            })),
            _ => Ok(json!({
                "content": [{"type": "text", "text": format!("ok:{key}")}],
                "isError": false
            })),
        }
    }

    async fn instructions(&self) -> Option<String> {
        None
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) {}
}

fn listing() -> Value {
    json!({
        "tools": [{
            "name": "get_jira_ticket",
            "description": "Fetch an issue",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "issue_key": {"type": "string"},
                    "delay_ms": {"type": "integer"}
                },
                "required": ["issue_key"]
            }
        }]
    })
}

fn executor(timeout: Duration) -> (BackendExecutor, Arc<StubConnection>) {
    let connection = Arc::new(StubConnection::new());
    let registry = CapabilityRegistry::from_listing(&listing()).expect("registry");
    let executor = BackendExecutor::new(connection.clone(), Arc::new(registry), timeout);
    (executor, connection)
}

fn request(id: &str, arguments: Value) -> InvocationRequest {
    InvocationRequest::new(id, "get_jira_ticket", arguments)
}

#[tokio::test]
async fn successful_call_carries_server_text() {
    let (executor, _) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&request("c1", json!({"issue_key": "PROJ-1"})))
        .await;
    assert!(result.is_success());
    assert_eq!(result.payload, "ok:PROJ-1");
    assert_eq!(result.invocation_id, "c1");
}

#[tokio::test]
async fn unknown_operation_never_reaches_the_backend() {
    let (executor, connection) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&InvocationRequest::new("c1", "delete_everything", json!({})))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::UnknownOperation));
    assert!(result.payload.contains("get_jira_ticket"));
    assert_eq!(connection.call_count(), 0);
}

#[tokio::test]
async fn schema_violations_are_invalid_arguments() {
    let (executor, connection) = executor(Duration::from_secs(5));
    let result = executor.execute(&request("c1", json!({}))).await;
    assert_eq!(result.status, InvocationStatus::Error);
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidArguments));
    assert!(result.payload.contains("issue_key"));
    assert_eq!(connection.call_count(), 0);
}

#[tokio::test]
async fn coerced_arguments_are_sent() {
    let (executor, connection) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&request("c1", json!({"issue_key": 42, "delay_ms": "1"})))
        .await;
    assert!(result.is_success());
    let sent = connection.calls.lock().expect("calls lock")[0].clone();
    assert_eq!(sent, json!({"issue_key": "42", "delay_ms": 1}));
}

#[tokio::test]
async fn backend_error_kind_is_preserved() {
    let (executor, _) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&request("c1", json!({"issue_key": "NOPE-1"})))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
    assert_eq!(result.payload, "Error (not_found): issue NOPE-1 not found");
    assert!(!executor.connection_lost());
}

#[tokio::test]
async fn rpc_invalid_params_maps_to_invalid_arguments() {
    let (executor, _) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&request("c1", json!({"issue_key": "RPC-1"})))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidArguments));
    assert!(!executor.connection_lost());
}

#[tokio::test]
async fn terminated_connection_is_unavailable_and_flagged() {
    let (executor, _) = executor(Duration::from_secs(5));
    let result = executor
        .execute(&request("c1", json!({"issue_key": "DROP-1"})))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::BackendUnavailable));
    assert!(executor.connection_lost());
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out() {
    let (executor, _) = executor(Duration::from_secs(2));
    let result = executor
        .execute(&request("c1", json!({"issue_key": "SLOW-1", "delay_ms": 60_000})))
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert!(result.payload.starts_with("Error (timeout):"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_results_keep_request_order() {
    let (executor, _) = executor(Duration::from_secs(5));
    let requests = vec![
        request("first", json!({"issue_key": "A-1", "delay_ms": 300})),
        request("second", json!({"issue_key": "B-1", "delay_ms": 10})),
        request("third", json!({"issue_key": "C-1", "delay_ms": 150})),
    ];
    let results = executor.execute_all(&requests, true).await;
    let ids: Vec<_> = results.iter().map(|r| r.invocation_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
    assert_eq!(results[1].payload, "ok:B-1");
}

#[tokio::test]
async fn sequential_dispatch_runs_in_order() {
    let (executor, connection) = executor(Duration::from_secs(5));
    let requests = vec![
        request("a", json!({"issue_key": "A-1"})),
        request("b", json!({"issue_key": "B-1"})),
    ];
    let results = executor.execute_all(&requests, false).await;
    assert_eq!(results.len(), 2);
    let calls = connection.calls.lock().expect("calls lock");
    assert_eq!(calls[0]["issue_key"], "A-1");
    assert_eq!(calls[1]["issue_key"], "B-1");
}
