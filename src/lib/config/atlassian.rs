//! Atlassian credentials, read from the environment (and `config/.env`).

use super::error::ConfigError;
use super::loader::ensure_env_loaded;
use std::env;

pub const JIRA_BASE_URL_VAR: &str = "JIRA_BASE_URL";
pub const CONFLUENCE_BASE_URL_VAR: &str = "CONFLUENCE_BASE_URL";
pub const EMAIL_VAR: &str = "JIRA_EMAIL";
pub const JIRA_TOKEN_VAR: &str = "JIRA_API_TOKEN";
pub const CONFLUENCE_TOKEN_VAR: &str = "CONFLUENCE_API_TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct AtlassianConfig {
    pub jira_base_url: String,
    pub confluence_base_url: String,
    pub email: String,
    pub jira_api_token: String,
    pub confluence_api_token: String,
}

impl std::fmt::Debug for AtlassianConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlassianConfig")
            .field("jira_base_url", &self.jira_base_url)
            .field("confluence_base_url", &self.confluence_base_url)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AtlassianConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        ensure_env_loaded();
        Ok(Self {
            jira_base_url: required(JIRA_BASE_URL_VAR)?,
            confluence_base_url: required(CONFLUENCE_BASE_URL_VAR)?,
            email: required(EMAIL_VAR)?,
            jira_api_token: required(JIRA_TOKEN_VAR)?,
            confluence_api_token: required(CONFLUENCE_TOKEN_VAR)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEnv { name })
}
