//! JSON-over-HTTP client for the platform API.
//!
//! Every request goes to `{api_base_url}{path}` and carries
//! `Authorization: Bearer <token>` once a session exists. Non-2xx
//! responses become `BalanceedError::Http` with the server's `detail`
//! message when one is present.

use std::fmt;

use balanceed_core::{BalanceedError, Config, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Client for the platform REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client for the configured API with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::Network` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BalanceedError::network(e.to_string()))?;

        Ok(Self {
            base_url: config.api_base().to_string(),
            http,
            token: None,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer credential attached to requests, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replaces the bearer credential.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    /// `GET {path}`, decoding the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// `POST {path}` with a JSON body, decoding the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// `POST {path}` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.post(self.url(path))).await
    }

    /// `PUT {path}` without a body.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.put(self.url(path))).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| BalanceedError::network(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| BalanceedError::network(e.to_string()))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), url = %url, "Request failed");
            let message = error_detail(&body)
                .or_else(|| status.canonical_reason().map(ToString::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(BalanceedError::http(status.as_u16(), message));
        }

        // Endpoints that return nothing still decode into `Value::Null`.
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| BalanceedError::invalid_response(format!("{url}: {e}")))
    }
}

/// Extracts a human-readable message from an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` and
/// `{"message": "..."}`.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
