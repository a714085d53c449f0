//! Document fetching
//!
//! `DocumentFetcher` is the seam between ingestion and the network. The
//! default `HttpFetcher` GETs `http(s)` URLs with a timeout and reads any
//! other location (plain path or `file://` URL) from disk.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Default budget for one document fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of raw OpenAPI documents.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch and decode the JSON document at `url`.
    ///
    /// Timeouts, transport failures, non-2xx statuses and undecodable bodies
    /// are all `Error::Fetch`.
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// `reqwest`-backed fetcher with local-file fallback
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("swagger-index/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::fetch("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &str) -> Result<Value> {
        tracing::info!("Fetching OpenAPI document from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::fetch(url, describe_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("server responded with {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(url, describe_reqwest_error(&e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| Error::fetch(url, format!("response is not valid JSON: {}", e)))
    }

    async fn fetch_file(&self, location: &str) -> Result<Value> {
        let path = match location.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(location),
        };
        tracing::info!("Loading OpenAPI document from {}", path.display());

        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::fetch(location, e.to_string()))?;

        serde_json::from_slice(&contents)
            .map_err(|e| Error::fetch(location, format!("file is not valid JSON: {}", e)))
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        if is_remote(url) {
            self.fetch_http(url).await
        } else {
            self.fetch_file(url).await
        }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }

    // The caller already reports the URL
    let mut message = err.to_string();
    if let Some(url) = err.url() {
        message = message.replace(&format!(" ({})", url), "");
    }
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if err.is_connect() {
        format!("connection failed: {}", message)
    } else {
        message
    }
}

/// Fetcher serving a fixed document, for tests and offline ingestion.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    document: Value,
}

impl StaticFetcher {
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Value> {
        Ok(self.document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("http://localhost:8080/v3/api-docs"));
        assert!(is_remote("https://example.com/openapi.json"));
        assert!(!is_remote("file:///tmp/openapi.json"));
        assert!(!is_remote("./openapi.json"));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");
        std::fs::write(&path, r#"{"openapi": "3.0.0", "info": {"version": "1"}}"#).unwrap();

        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).unwrap();
        let doc = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(doc["info"]["version"], "1");

        let url = format!("file://{}", path.display());
        assert_eq!(fetcher.fetch(&url).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).unwrap();
        let err = fetcher.fetch("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new(json!({"paths": {}}));
        assert_eq!(fetcher.fetch("anything").await.unwrap(), json!({"paths": {}}));
    }
}
