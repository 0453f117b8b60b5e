use crate::domain::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("{service} denied access: {message}")]
    PermissionDenied { service: String, message: String },
    #[error("{service} is unavailable: {message}")]
    Unavailable { service: String, message: String },
    #[error("{service} returned an unexpected payload: {reason}")]
    InvalidResponse { service: String, reason: String },
    #[error("'{value}' is not a valid {what}")]
    InvalidIdentifier { what: &'static str, value: String },
    #[error("{count} pages titled '{title}' already exist in space {space_key}")]
    Conflict {
        space_key: String,
        title: String,
        count: usize,
    },
}

impl BackendError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_identifier(what: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            what,
            value: value.into(),
        }
    }

    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(
        service: &str,
        resource: &str,
        status: StatusCode,
        body: &str,
    ) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            format!("HTTP {} - {}", status.as_u16(), body.trim())
        };
        match status {
            StatusCode::NOT_FOUND => Self::not_found(resource),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::PermissionDenied {
                service: service.to_string(),
                message,
            },
            _ => Self::unavailable(service, message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::NotFound { .. } => ErrorKind::NotFound,
            BackendError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            BackendError::Unavailable { .. } | BackendError::InvalidResponse { .. } => {
                ErrorKind::BackendUnavailable
            }
            BackendError::Conflict { .. } => ErrorKind::Conflict,
            BackendError::InvalidIdentifier { .. } => ErrorKind::InvalidArguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_maps_to_error_kind() {
        let cases = [
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::UNAUTHORIZED, ErrorKind::PermissionDenied),
            (StatusCode::FORBIDDEN, ErrorKind::PermissionDenied),
            (StatusCode::BAD_GATEWAY, ErrorKind::BackendUnavailable),
            (StatusCode::BAD_REQUEST, ErrorKind::BackendUnavailable),
        ];
        for (status, expected) in cases {
            let err = BackendError::from_status("jira", "issue X-1", status, "");
            assert_eq!(err.kind(), expected, "status {status}");
        }
    }
}
