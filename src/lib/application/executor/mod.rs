//! Backend executor
//!
//! Turns [`InvocationRequest`]s into [`InvocationResult`]s over a live MCP
//! connection. Every failure becomes an error-status result; nothing here
//! returns `Err` or panics on bad input.

mod validation;

#[cfg(test)]
mod tests;

pub use validation::{ArgumentViolations, prepare_arguments};

use crate::application::formatter::format_error;
use crate::application::registry::CapabilityRegistry;
use crate::application::tooling::{ToolInvokeError, ToolServerInterface};
use crate::domain::{ErrorKind, InvocationRequest, InvocationResult};
use crate::infrastructure::rpc::types::{INVALID_PARAMS, METHOD_NOT_FOUND};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct BackendExecutor {
    connection: Arc<dyn ToolServerInterface>,
    registry: Arc<CapabilityRegistry>,
    call_timeout: Duration,
    connection_lost: AtomicBool,
}

impl BackendExecutor {
    pub fn new(
        connection: Arc<dyn ToolServerInterface>,
        registry: Arc<CapabilityRegistry>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            connection,
            registry,
            call_timeout,
            connection_lost: AtomicBool::new(false),
        }
    }

    /// Set once any call fails because the connection itself went away.
    pub fn connection_lost(&self) -> bool {
        self.connection_lost.load(Ordering::SeqCst)
    }

    pub async fn execute(&self, request: &InvocationRequest) -> InvocationResult {
        let Some(descriptor) = self.registry.get(&request.operation_name) else {
            warn!(
                operation = %request.operation_name,
                invocation = %request.invocation_id,
                "Rejected unknown operation"
            );
            let detail = format!(
                "operation '{}' is not offered by the backend (available: {})",
                request.operation_name,
                self.registry.names().join(", ")
            );
            return failure(request, ErrorKind::UnknownOperation, &detail);
        };

        let arguments = match prepare_arguments(&descriptor.input_schema, request.arguments.clone())
        {
            Ok(arguments) => arguments,
            Err(violations) => {
                debug!(
                    operation = %descriptor.name,
                    fields = ?violations.fields,
                    "Arguments failed schema validation"
                );
                return failure(request, ErrorKind::InvalidArguments, &violations.describe());
            }
        };

        info!(
            operation = %descriptor.name,
            invocation = %request.invocation_id,
            "Dispatching operation"
        );
        let call = self.connection.call_tool(&descriptor.name, arguments);
        match tokio::time::timeout(self.call_timeout, call).await {
            Err(_) => {
                warn!(
                    operation = %descriptor.name,
                    timeout_secs = self.call_timeout.as_secs_f64(),
                    "Operation timed out"
                );
                let detail = format!(
                    "no response from the backend within {:.1}s",
                    self.call_timeout.as_secs_f64()
                );
                failure(request, ErrorKind::Timeout, &detail)
            }
            Ok(Err(err)) => self.call_failure(request, err),
            Ok(Ok(value)) => interpret_call_result(request, &value),
        }
    }

    /// Execute a turn's requests. Results come back in request order even
    /// when calls finish out of order.
    pub async fn execute_all(
        &self,
        requests: &[InvocationRequest],
        parallel: bool,
    ) -> Vec<InvocationResult> {
        if parallel {
            join_all(requests.iter().map(|request| self.execute(request))).await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.execute(request).await);
            }
            results
        }
    }

    fn call_failure(&self, request: &InvocationRequest, err: ToolInvokeError) -> InvocationResult {
        if err.is_connection_failure() {
            warn!(operation = %request.operation_name, %err, "Backend connection lost");
            self.connection_lost.store(true, Ordering::SeqCst);
            return failure(request, ErrorKind::BackendUnavailable, &err.to_string());
        }

        let kind = match &err {
            ToolInvokeError::Rpc { code, .. } if *code == METHOD_NOT_FOUND => {
                ErrorKind::UnknownOperation
            }
            ToolInvokeError::Rpc { code, .. } if *code == INVALID_PARAMS => {
                ErrorKind::InvalidArguments
            }
            _ => ErrorKind::BackendUnavailable,
        };
        warn!(operation = %request.operation_name, %err, kind = %kind, "Operation failed");
        failure(request, kind, &err.to_string())
    }
}

fn failure(request: &InvocationRequest, kind: ErrorKind, detail: &str) -> InvocationResult {
    InvocationResult::failure(request, kind, format_error(kind, detail))
}

/// Map an MCP `CallToolResult` onto an invocation result.
fn interpret_call_result(request: &InvocationRequest, value: &Value) -> InvocationResult {
    let text = value
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    let structured = value.get("structuredContent").cloned().unwrap_or(Value::Null);
    let is_error = value.get("isError").and_then(Value::as_bool).unwrap_or(false);

    if !is_error {
        return InvocationResult::success(request, text, structured);
    }

    let kind = structured
        .get("error")
        .and_then(|err| err.get("kind"))
        .and_then(Value::as_str)
        .and_then(ErrorKind::parse)
        .unwrap_or(ErrorKind::BackendUnavailable);
    let payload = if text.trim().is_empty() {
        format_error(kind, "")
    } else {
        text
    };
    InvocationResult::failure(request, kind, payload)
}
