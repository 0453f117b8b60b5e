use super::client::ChatClient;
use super::types::{ModelError, ModelRequest, ModelResponse};
use crate::config::ModelProviderConfig;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Anything that can answer a chat request for the agent loop.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

struct Route {
    models: HashSet<String>,
    client: ChatClient,
}

impl Route {
    fn serves(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }
}

/// Routes each request to the provider named in it.
pub struct DynamicModelProvider {
    routes: HashMap<String, Route>,
}

impl DynamicModelProvider {
    /// Build a client per provider and check that `default_provider` can
    /// serve `model` with the credentials it has.
    pub fn from_configs(
        configs: &[ModelProviderConfig],
        default_provider: &str,
        model: &str,
    ) -> Result<Self, ModelError> {
        let routes = configs
            .iter()
            .map(|config| {
                let route = Route {
                    models: config.models.iter().map(|m| m.name.clone()).collect(),
                    client: ChatClient::from_config(config),
                };
                (config.id.clone(), route)
            })
            .collect();
        let provider = Self { routes };

        let route = provider.route(default_provider, model)?;
        route.client.ensure_ready()?;
        info!(
            provider = default_provider,
            model,
            dialect = ?route.client.dialect(),
            url = route.client.url(),
            "Model route ready"
        );
        Ok(provider)
    }

    fn route(&self, provider: &str, model: &str) -> Result<&Route, ModelError> {
        let route = self
            .routes
            .get(provider)
            .ok_or_else(|| ModelError::provider_not_found(provider))?;
        if route.serves(model) {
            Ok(route)
        } else {
            Err(ModelError::model_not_found(provider, model))
        }
    }
}

#[async_trait]
impl ModelProvider for DynamicModelProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let route = self.route(&request.provider, &request.model)?;
        route.client.chat(&request).await
    }
}
