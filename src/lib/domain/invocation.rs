use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single tool call requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub invocation_id: String,
    pub operation_name: String,
    pub arguments: Value,
}

impl InvocationRequest {
    pub fn new(
        invocation_id: impl Into<String>,
        operation_name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            operation_name: operation_name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Success,
    Error,
}

/// Failure classes that stay inside a single invocation. They are reported
/// back to the agent as data instead of ending the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownOperation,
    InvalidArguments,
    NotFound,
    PermissionDenied,
    BackendUnavailable,
    Conflict,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownOperation => "unknown_operation",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unknown_operation" => Some(ErrorKind::UnknownOperation),
            "invalid_arguments" => Some(ErrorKind::InvalidArguments),
            "not_found" => Some(ErrorKind::NotFound),
            "permission_denied" => Some(ErrorKind::PermissionDenied),
            "backend_unavailable" => Some(ErrorKind::BackendUnavailable),
            "conflict" => Some(ErrorKind::Conflict),
            "timeout" => Some(ErrorKind::Timeout),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::UnknownOperation => "Unknown operation",
            ErrorKind::InvalidArguments => "Invalid arguments",
            ErrorKind::NotFound => "Not found",
            ErrorKind::PermissionDenied => "Permission denied",
            ErrorKind::BackendUnavailable => "Backend unavailable",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Timeout => "Timed out",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one [`InvocationRequest`], correlated by `invocation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub invocation_id: String,
    pub operation_name: String,
    pub status: InvocationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub payload: String,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub data: Value,
}

impl InvocationResult {
    pub fn success(request: &InvocationRequest, payload: impl Into<String>, data: Value) -> Self {
        Self {
            invocation_id: request.invocation_id.clone(),
            operation_name: request.operation_name.clone(),
            status: InvocationStatus::Success,
            error_kind: None,
            payload: payload.into(),
            data,
        }
    }

    pub fn failure(request: &InvocationRequest, kind: ErrorKind, payload: impl Into<String>) -> Self {
        Self {
            invocation_id: request.invocation_id.clone(),
            operation_name: request.operation_name.clone(),
            status: InvocationStatus::Error,
            error_kind: Some(kind),
            payload: payload.into(),
            data: Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }
}
