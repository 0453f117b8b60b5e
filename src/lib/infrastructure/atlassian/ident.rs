//! Checks for identifiers that end up inside REST paths

use super::error::BackendError;
use regex::Regex;
use std::sync::LazyLock;

static ISSUE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*-\d+$").expect("Invalid issue key regex"));

static PAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("Invalid page id regex"));

/// `PROJ-123` style keys only.
pub fn issue_key(key: &str) -> Result<&str, BackendError> {
    if ISSUE_KEY.is_match(key) {
        Ok(key)
    } else {
        Err(BackendError::invalid_identifier("issue key", key))
    }
}

/// Confluence content ids are numeric.
pub fn page_id(id: &str) -> Result<&str, BackendError> {
    if PAGE_ID.is_match(id) {
        Ok(id)
    } else {
        Err(BackendError::invalid_identifier("page id", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn issue_keys_accept_project_and_number() {
        for key in ["PROJ-123", "AB_2-7", "proj-9"] {
            assert!(issue_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn path_like_keys_are_rejected() {
        for key in ["X/../../rest/api/3/myself", "PROJ-1?expand=all", "PROJ", "-1", "PROJ-1/"] {
            let err = issue_key(key).expect_err(key);
            assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        }
        assert!(page_id("42").is_ok());
        assert!(page_id("42/../43").is_err());
    }
}
