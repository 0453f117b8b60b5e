//! Shared HTTP plumbing for Atlassian REST clients

use super::error::BackendError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client bound to one Atlassian service base URL.
#[derive(Clone)]
pub struct AtlassianHttp {
    pub service: String,
    pub base_url: String,
    authorization: String,
    http: Client,
}

impl AtlassianHttp {
    pub fn new(
        service: impl Into<String>,
        base_url: impl Into<String>,
        email: &str,
        token: &str,
    ) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            service: service.into(),
            base_url: base_url.into(),
            authorization: basic_auth(email, token),
            http,
        }
    }

    /// Build URL from base URL and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub async fn get_json<Res>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: &str,
    ) -> Result<Res, BackendError>
    where
        Res: DeserializeOwned,
    {
        let url = self.build_url(path);
        debug!(service = %self.service, %url, "GET");
        self.send(self.http.get(&url).query(query), resource).await
    }

    pub async fn post_json<Req, Res>(
        &self,
        path: &str,
        body: &Req,
        resource: &str,
    ) -> Result<Res, BackendError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let url = self.build_url(path);
        debug!(service = %self.service, %url, "POST");
        self.send(self.http.post(&url).json(body), resource).await
    }

    pub async fn put_json<Req, Res>(
        &self,
        path: &str,
        body: &Req,
        resource: &str,
    ) -> Result<Res, BackendError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let url = self.build_url(path);
        debug!(service = %self.service, %url, "PUT");
        self.send(self.http.put(&url).json(body), resource).await
    }

    async fn send<Res>(&self, builder: RequestBuilder, resource: &str) -> Result<Res, BackendError>
    where
        Res: DeserializeOwned,
    {
        let response = builder
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| BackendError::unavailable(&self.service, source.to_string()))?;

        let status = response.status();
        debug!(service = %self.service, status = status.as_u16(), "Response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(&self.service, resource, status, &body));
        }

        response
            .json::<Res>()
            .await
            .map_err(|source| BackendError::invalid_response(&self.service, source.to_string()))
    }
}

fn basic_auth(email: &str, token: &str) -> String {
    let encoded = BASE64_STANDARD.encode(format!("{email}:{token}"));
    format!("Basic {encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_encodes_email_and_token() {
        assert_eq!(
            basic_auth("me@example.com", "secret"),
            "Basic bWVAZXhhbXBsZS5jb206c2VjcmV0"
        );
    }

    #[test]
    fn build_url_normalises_slashes() {
        let http = AtlassianHttp::new("confluence", "https://x.test/wiki/", "a", "b");
        assert_eq!(
            http.build_url("/rest/api/content"),
            "https://x.test/wiki/rest/api/content"
        );
    }
}
