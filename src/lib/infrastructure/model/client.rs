use super::types::{ModelError, ModelRequest, ModelResponse};
use crate::config::ModelProviderConfig;
use crate::domain::ChatMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Wire format spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `POST /v1/chat/completions` with a bearer token; reply in `choices[0].message`.
    OpenAi,
    /// `POST /api/chat` without auth; reply in `message`.
    Ollama,
}

impl Dialect {
    /// `ollama` and `localai` providers speak Ollama's API, everything else
    /// is treated as OpenAI-compatible.
    pub fn of(config: &ModelProviderConfig) -> Self {
        if config.is_ollama() || config.provider_type.eq_ignore_ascii_case("localai") {
            Dialect::Ollama
        } else {
            Dialect::OpenAi
        }
    }

    fn default_path(self) -> &'static str {
        match self {
            Dialect::OpenAi => "/v1/chat/completions",
            Dialect::Ollama => "/api/chat",
        }
    }
}

/// Resolve an API key from the environment variable named in config.
pub fn resolve_api_key(provider: &str, env_var: Option<&str>) -> Option<String> {
    let name = env_var.map(str::trim).filter(|name| !name.is_empty())?;
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!(provider, env_var = name, "API key environment variable is empty");
            None
        }
        Err(err) => {
            warn!(provider, env_var = name, %err, "API key environment variable is not set");
            None
        }
    }
}

/// One configured provider endpoint.
#[derive(Clone)]
pub struct ChatClient {
    provider: String,
    dialect: Dialect,
    url: String,
    api_key: Option<String>,
    http: Client,
}

impl ChatClient {
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let dialect = Dialect::of(config);
        let path = config
            .api_path
            .as_deref()
            .unwrap_or(dialect.default_path());
        let api_key = match dialect {
            Dialect::OpenAi => resolve_api_key(&config.id, config.api_key.as_deref()),
            Dialect::Ollama => None,
        };
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            provider: config.id.clone(),
            dialect,
            url: join_url(&config.endpoint, path),
            api_key,
            http,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fails when the endpoint needs credentials that were not found.
    pub fn ensure_ready(&self) -> Result<(), ModelError> {
        match self.dialect {
            Dialect::OpenAi => self.bearer().map(|_| ()),
            Dialect::Ollama => Ok(()),
        }
    }

    fn bearer(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ModelError::missing_api_key(&self.provider))
    }

    pub async fn chat(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let payload = ChatPayload {
            model: &request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            stream: false,
        };
        info!(
            provider = %self.provider,
            model = %request.model,
            dialect = ?self.dialect,
            messages = request.messages.len(),
            "Sending chat request"
        );

        let mut builder = self.http.post(&self.url).json(&payload);
        if self.dialect == Dialect::OpenAi {
            builder = builder.bearer_auth(self.bearer()?);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::network(&self.provider, e))?
            .error_for_status()
            .map_err(|e| ModelError::network(&self.provider, e))?;

        let content = match self.dialect {
            Dialect::OpenAi => response
                .json::<CompletionReply>()
                .await
                .map_err(|e| ModelError::invalid_response(&self.provider, e.to_string()))?
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message),
            Dialect::Ollama => response
                .json::<OllamaReply>()
                .await
                .map_err(|e| ModelError::invalid_response(&self.provider, e.to_string()))?
                .message,
        }
        .map(|message| message.content)
        .ok_or_else(|| ModelError::invalid_response(&self.provider, "reply has no message"))?;

        debug!(provider = %self.provider, chars = content.len(), "Chat reply received");
        Ok(ModelResponse::new(content))
    }
}

fn join_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct OllamaReply {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}
