//! In-memory fetch double for probe tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::http::{Fetch, HttpError, HttpResponse};

/// Serves canned responses by path and records every request
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, (u16, String)>,
    failures: HashMap<String, HttpError>,
    requests: Mutex<Vec<String>>,
    headers_only: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn fail(mut self, path: &str, error: HttpError) -> Self {
        self.failures.insert(path.to_string(), error);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// How many of the requests left the body unread
    pub fn headers_only_count(&self) -> usize {
        self.headers_only.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for FakeFetcher {
    async fn get(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(path.to_string());

        if let Some(err) = self.failures.get(path) {
            return Err(err.clone());
        }

        let (status_code, body) = self
            .routes
            .get(path)
            .cloned()
            .unwrap_or((404, "Not Found".to_string()));

        Ok(HttpResponse {
            path: path.to_string(),
            status_code,
            body,
            duration_ms: 1,
        })
    }

    async fn get_headers(&self, path: &str) -> Result<HttpResponse, HttpError> {
        self.headers_only.fetch_add(1, Ordering::SeqCst);
        let mut response = self.get(path).await?;
        response.body.clear();
        Ok(response)
    }
}
