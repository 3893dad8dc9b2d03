//! JSON REST client for API-level waits.
//!
//! Errors come back as [`ApiError`], which converts into [`CheckError`] with
//! `?` inside a condition. A 404 or 503 is retried by the poller; any other
//! status, a transport failure or an undecodable body aborts the wait.
//!
//! [`CheckError`]: crate::result::CheckError

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::result::ApiError;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to a base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new client pointing at the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest client (auth headers, timeouts)
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path));
        let body = self.send("GET", path, request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST `body` as JSON to `path` and decode the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(path)).json(body);
        let body = self.send("POST", path, request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// DELETE `path`, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(path));
        let _ = self.send("DELETE", path, request).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        let start = Instant::now();
        let resp = request.send().await?;
        let status = resp.status();
        tracing::debug!(
            method,
            path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "api request"
        );

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}
