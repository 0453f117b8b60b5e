//! # Provider Configuration
//!
//! Model providers the agent can talk to.
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `openai` | OpenAI-compatible chat completions | Usually |
//! | `ollama` / `localai` | Local Ollama-style chat server | No |

use serde::Deserialize;

/// A model exposed by a provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Configuration for one model provider.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "openai"
/// type = "openai"
/// endpoint = "https://api.openai.com"
/// api_key = "OPENAI_API_KEY"
/// models = ["gpt-4o-mini"]
/// ```
///
/// `api_key` names the environment variable that holds the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProviderConfig {
    pub id: String,
    pub provider_type: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Overrides the chat path (default `/v1/chat/completions` for OpenAI).
    pub api_path: Option<String>,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<RawModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RawModelInfo {
    Name(String),
    Detailed(ModelInfo),
}

impl From<RawModelInfo> for ModelInfo {
    fn from(value: RawModelInfo) -> Self {
        match value {
            RawModelInfo::Name(name) => Self {
                name,
                display_name: None,
            },
            RawModelInfo::Detailed(info) => info,
        }
    }
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            models: raw.models.into_iter().map(ModelInfo::from).collect(),
        }
    }
}

impl ModelProviderConfig {
    /// Ensure a model exists in this provider's model list
    pub fn ensure_model(&mut self, model: &str) {
        if self.models.iter().all(|info| info.name != model) {
            self.models.push(ModelInfo {
                name: model.to_string(),
                display_name: None,
            });
        }
    }

    /// Check if this is an Ollama provider (case-insensitive).
    ///
    /// ```
    /// use atlassian_mcp_bridge::config::ModelProviderConfig;
    ///
    /// let provider = ModelProviderConfig {
    ///     id: "local".to_string(),
    ///     provider_type: "Ollama".to_string(),
    ///     endpoint: "http://localhost:11434".to_string(),
    ///     api_key: None,
    ///     api_path: None,
    ///     models: vec![],
    /// };
    /// assert!(provider.is_ollama());
    /// ```
    pub fn is_ollama(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("ollama")
    }
}
