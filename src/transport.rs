//! The HTTP seam the core consumes.
//!
//! Pagination and polling only need a handful of JSON round trips, so they are
//! written against this trait rather than against [`crate::http::PlatformHttp`]
//! directly. Errors are returned untouched; nothing above this layer retries.

use crate::error::HttpError;
use async_trait::async_trait;
use serde_json::Value;

/// Query-string pairs, in the order they are sent.
pub type QueryParams = Vec<(String, String)>;

/// Outcome of a single status-endpoint poll.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPoll {
    /// The job is still running (or failed); the body carries its status.
    Pending(Value),
    /// The server redirected (303) to the finished resource.
    Finished { location: String },
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `params` appended to its query string.
    async fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value, HttpError>;

    /// POST a JSON body and decode a JSON response (an empty body decodes to `null`).
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, HttpError>;

    /// POST a JSON body to an async endpoint and return its `Location` header.
    async fn post_for_location(&self, url: &str, body: &Value) -> Result<String, HttpError>;

    /// GET a status URL without following redirects.
    async fn poll_status(&self, url: &str) -> Result<StatusPoll, HttpError>;
}
