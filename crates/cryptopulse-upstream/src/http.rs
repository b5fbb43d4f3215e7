use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::retry::{with_retry, RetryPolicy};

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Transport-level options shared by every upstream client.
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 20,
        }
    }
}

/// A JSON HTTP session against one upstream service.
pub struct ApiClient {
    service: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        headers: HeaderMap,
        options: ClientOptions,
    ) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .map_err(|e| UpstreamError::Setup(format!("{service} client: {e}")))?;

        Ok(Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// One GET attempt. Non-2xx statuses and non-JSON bodies are errors.
    pub async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let url = self.url(endpoint);
        debug!(service = self.service, url = %url, "GET");

        let mut request = self.http.get(&url).query(params);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.read_json(request).await
    }

    /// Retrying GET: up to `policy.max_attempts` attempts with a fixed pause.
    pub async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        bearer: Option<&str>,
        policy: &RetryPolicy,
    ) -> Result<Value, UpstreamError> {
        with_retry(policy, self.service, || self.get_json(endpoint, params, bearer)).await
    }

    /// One POST attempt with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let url = self.url(endpoint);
        debug!(service = self.service, url = %url, "POST");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.read_json(request).await
    }

    /// One POST attempt with a form body and basic auth.
    pub async fn post_form_basic_auth(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        username: &str,
        password: &str,
    ) -> Result<Value, UpstreamError> {
        let url = self.url(endpoint);
        debug!(service = self.service, url = %url, "POST form");

        let request = self
            .http
            .post(&url)
            .basic_auth(username, Some(password))
            .form(form);
        self.read_json(request).await
    }

    async fn read_json(&self, request: reqwest::RequestBuilder) -> Result<Value, UpstreamError> {
        let service = self.service;
        let response = request
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { service, source })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(UpstreamError::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| UpstreamError::Transport { service, source })?;
        serde_json::from_str(&text)
            .map_err(|e| UpstreamError::malformed(service, format!("invalid JSON: {e}")))
    }
}
