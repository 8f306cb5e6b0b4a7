use std::fmt::Debug;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Unified failure for a single HTTP attempt.
///
/// Timeouts, connection failures, non-2xx statuses and unexpected transport
/// errors all collapse into this one kind; the message keeps the
/// distinguishing text. A failed attempt is never retried.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RequestError {
    message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_reqwest(err: &reqwest::Error, url: &Url) -> Self {
        if err.is_timeout() {
            Self::new(format!("Request timeout for {url}"))
        } else if err.is_connect() {
            Self::new(format!("Connection error for {url}"))
        } else {
            Self::new(format!("Unexpected error for {url}: {err}"))
        }
    }
}

/// Seam between the upstream adapter and the wire.
///
/// The production implementation is [`HttpClient`]; tests substitute their
/// own to observe calls or inject failures.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RequestError>;

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, RequestError>;
}

/// HTTP transport against the configured upstream base URL.
///
/// Holds one reusable connection pool for the process lifetime; the pool is
/// released when the client is dropped at shutdown.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid upstream base URL: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = Client::builder()
            .user_agent(format!("fogcast-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url, timeout })
    }

    /// Join the base URL and a request path, tolerating leading slashes.
    fn url(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RequestError::new(format!("Invalid request path '{path}': {e}")))
    }

    async fn read_body(url: &Url, res: reqwest::Response) -> Result<Value, RequestError> {
        let status = res.status();
        let body = res.text().await.map_err(|e| RequestError::from_reqwest(&e, url))?;

        if !status.is_success() {
            let err =
                RequestError::new(format!("HTTP error {status} for {url}: {}", truncate_body(&body)));
            error!("{err}");
            return Err(err);
        }

        // Non-JSON bodies are tolerated and handed back as raw text.
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "data": body })))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RequestError> {
        let url = self.url(path)?;
        debug!("Making GET request to {url} with params: {query:?}");

        let res = self
            .http
            .get(url.clone())
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                let err = RequestError::from_reqwest(&e, &url);
                error!("{err}");
                err
            })?;

        Self::read_body(&url, res).await
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, RequestError> {
        let url = self.url(path)?;
        debug!("Making POST request to {url}");

        let mut req = self.http.post(url.clone()).timeout(self.timeout);
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|e| {
            let err = RequestError::from_reqwest(&e, &url);
            error!("{err}");
            err
        })?;

        Self::read_body(&url, res).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_tolerates_slashes() {
        let client =
            HttpClient::new("http://localhost:5000", Duration::from_secs(30)).expect("client");
        assert_eq!(client.url("/models").unwrap().as_str(), "http://localhost:5000/models");
        assert_eq!(client.url("models").unwrap().as_str(), "http://localhost:5000/models");

        let client =
            HttpClient::new("http://localhost:5000/", Duration::from_secs(30)).expect("client");
        assert_eq!(
            client.url("/actual/live-data").unwrap().as_str(),
            "http://localhost:5000/actual/live-data"
        );
    }

    #[test]
    fn base_url_path_is_preserved() {
        let client =
            HttpClient::new("http://localhost:5000/api", Duration::from_secs(30)).expect("client");
        assert_eq!(client.url("/models").unwrap().as_str(), "http://localhost:5000/api/models");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(HttpClient::new("not a url", Duration::from_secs(30)).is_err());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
