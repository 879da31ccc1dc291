//! HTTP client for probing the target server
//!
//! Wraps reqwest behind the [`Fetch`] trait so probes can run against
//! the real server or an in-memory double.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read response body: {0}")]
    BodyRead(String),
}

/// Anything that can GET a same-origin path.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `path` and read the full body as text
    async fn get(&self, path: &str) -> Result<HttpResponse, HttpError>;

    /// GET `path`, returning as soon as the status line and headers arrive.
    ///
    /// The body is left unread: `body` is empty and `duration_ms` stops at
    /// the headers.
    async fn get_headers(&self, path: &str) -> Result<HttpResponse, HttpError> {
        let mut response = self.get(path).await?;
        response.body.clear();
        Ok(response)
    }
}

/// reqwest-backed client bound to a single origin
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid base URL: {base_url}"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            timeout_secs,
        })
    }

    /// Build full URL
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    fn classify(&self, err: reqwest::Error, url: &str) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            HttpError::ConnectionRefused(url.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(url.to_string())
        } else {
            HttpError::RequestFailed(err.to_string())
        }
    }

    async fn send(&self, path: &str) -> Result<(reqwest::Response, Instant), HttpError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e, &url))?;

        Ok((response, start))
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get(&self, path: &str) -> Result<HttpResponse, HttpError> {
        let (response, start) = self.send(path).await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::BodyRead(e.to_string()))?;

        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(HttpResponse {
            path: path.to_string(),
            status_code: status.as_u16(),
            body,
            duration_ms,
        })
    }

    async fn get_headers(&self, path: &str) -> Result<HttpResponse, HttpError> {
        let (response, start) = self.send(path).await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        debug!("Headers: {} in {}ms", status.as_u16(), duration_ms);

        Ok(HttpResponse {
            path: path.to_string(),
            status_code: status.as_u16(),
            body: String::new(),
            duration_ms,
        })
    }
}

/// HTTP response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpResponse {
    pub path: String,
    pub status_code: u16,
    pub body: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    /// Only an exact 200 counts; redirects and 204s are errors to the probes.
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}
