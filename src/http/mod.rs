//! HTTP client layer: `PlatformHttp` with per-request retry policies.

pub mod client;
pub mod retry;

pub use client::PlatformHttp;
pub use retry::{RetryConfig, RetryPolicy};
