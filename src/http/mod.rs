//! HTTP client module
//!
//! Provides the fetch capability the probes run against.

mod client;

pub use client::{Fetch, HttpClient, HttpError, HttpResponse};
