//! High-level client: `PlatformClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, list iteration and async-job helpers.

use crate::config::{self, ClientConfig, ConfigLoader};
use crate::domain::partitioning::client::Partitioning;
use crate::error::SdkError;
use crate::http::client::HttpOptions;
use crate::http::PlatformHttp;
use crate::mapping::{ApiObject, KeepNulls};
use crate::pagination;
use crate::polling::{self, AsyncResolution, PollConfig};
use crate::transport::{QueryParams, Transport};

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::domain::partitioning::client::Partitioning as PartitioningClient;

/// The primary entry point for the SDK.
///
/// Configuration is explicit: a client is built from a [`ClientConfig`] and
/// carries it for its whole life. The process-wide default is consulted only
/// by [`PlatformClient::from_default_config`].
#[derive(Debug, Clone)]
pub struct PlatformClient {
    pub(crate) http: PlatformHttp,
    pub(crate) poll_config: PollConfig,
}

impl PlatformClient {
    pub fn builder() -> PlatformClientBuilder {
        PlatformClientBuilder::default()
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, SdkError> {
        let http = PlatformHttp::with_options(&config.endpoint, HttpOptions::from_config(config))?
            .with_token(&config.token);
        Ok(Self {
            http,
            poll_config: PollConfig::default(),
        })
    }

    /// Build from the process-wide default, falling back to the usual
    /// config-file and environment lookup.
    pub fn from_default_config() -> Result<Self, SdkError> {
        let config = match config::default_config() {
            Some(config) => config,
            None => ConfigLoader::new().resolve()?,
        };
        Self::from_config(&config)
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn partitioning(&self) -> Partitioning<'_> {
        Partitioning { client: self }
    }

    pub fn transport(&self) -> &dyn Transport {
        &self.http
    }

    pub fn http(&self) -> &PlatformHttp {
        &self.http
    }

    // ── Lists ────────────────────────────────────────────────────────────

    /// Raw records of a `next`-linked list endpoint.
    pub fn unpaginate(
        &self,
        path: &str,
        params: QueryParams,
    ) -> impl Stream<Item = Result<Value, SdkError>> + Send + '_ {
        pagination::unpaginate(&self.http, path, params)
    }

    /// Typed records of a list endpoint, each built through `T`'s schema.
    ///
    /// A record that fails validation is yielded as an error; iteration can
    /// continue past it.
    pub fn list<T>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> impl Stream<Item = Result<T, SdkError>> + Send + '_
    where
        T: ApiObject + Send + 'static,
    {
        self.unpaginate(path, params)
            .map(|record| record.and_then(|data| T::from_server_data(&data, &KeepNulls::None)))
    }

    // ── Async jobs ───────────────────────────────────────────────────────

    /// Poll a status URL with this client's [`PollConfig`].
    pub async fn wait_for_async_resolution(
        &self,
        status_url: &str,
    ) -> Result<AsyncResolution, SdkError> {
        polling::wait_for_async_resolution(&self.http, status_url, &self.poll_config).await
    }

    /// POST to an async endpoint and wait for the job it starts.
    pub async fn submit_and_wait(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<AsyncResolution, SdkError> {
        let status_url = self.http.post_for_location(path, body).await?;
        tracing::debug!(status_url = %status_url, "Submitted async job");
        self.wait_for_async_resolution(&status_url).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

/// Settings left unset are resolved through [`ConfigLoader`].
#[derive(Debug, Default)]
pub struct PlatformClientBuilder {
    config: Option<ClientConfig>,
    endpoint: Option<String>,
    token: Option<String>,
    config_path: Option<PathBuf>,
    connect_timeout: Option<Duration>,
    ssl_verify: Option<bool>,
    max_retries: Option<u32>,
    user_agent_suffix: Option<String>,
    poll_config: Option<PollConfig>,
}

impl PlatformClientBuilder {
    /// Use a fully resolved config; skips file and environment lookup.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = Some(verify);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn user_agent_suffix(mut self, suffix: &str) -> Self {
        self.user_agent_suffix = Some(suffix.to_string());
        self
    }

    pub fn poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = Some(poll_config);
        self
    }

    fn resolve_config(&mut self) -> Result<ClientConfig, SdkError> {
        if let Some(config) = self.config.take() {
            return Ok(config);
        }
        let mut loader = ConfigLoader::new();
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint(endpoint);
        }
        if let Some(token) = &self.token {
            loader = loader.token(token);
        }
        if let Some(path) = self.config_path.take() {
            loader = loader.config_path(path);
        }
        Ok(loader.resolve()?)
    }

    pub fn build(mut self) -> Result<PlatformClient, SdkError> {
        let mut config = self.resolve_config()?;
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout = timeout.as_secs_f64();
        }
        if let Some(verify) = self.ssl_verify {
            config.ssl_verify = verify;
        }
        if self.max_retries.is_some() {
            config.max_retries = self.max_retries;
        }
        if self.user_agent_suffix.is_some() {
            config.user_agent_suffix = self.user_agent_suffix.take();
        }

        let mut client = PlatformClient::from_config(&config)?;
        if let Some(poll_config) = self.poll_config {
            client.poll_config = poll_config;
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_explicit_settings() {
        let client = PlatformClient::builder()
            .endpoint("https://host/api/v2/")
            .token("secret")
            .max_retries(1)
            .poll_config(PollConfig::new(Duration::from_millis(5), Duration::from_secs(1)))
            .build()
            .unwrap();
        assert_eq!(client.http().base_url(), "https://host/api/v2");
        assert_eq!(client.poll_config.interval, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_from_config_sets_token() {
        let client =
            PlatformClient::from_config(&ClientConfig::new("https://host/api/v2", "t")).unwrap();
        assert!(client.http().has_auth_token().await);
    }

    #[test]
    fn test_builder_with_config_skips_lookup() {
        let client = PlatformClient::builder()
            .config(ClientConfig::new("https://configured", "t"))
            .build()
            .unwrap();
        assert_eq!(client.http().base_url(), "https://configured");
    }
}
