//! Low-level HTTP client: `PlatformHttp`.
//!
//! Resolves paths against the configured endpoint, injects the bearer token,
//! maps error statuses onto [`HttpError`] and retries idempotent requests.
//! Implements [`Transport`] for the pagination and polling core.

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::http::retry::{parse_retry_after, RetryConfig, RetryPolicy};
use crate::network::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::transport::{StatusPoll, Transport};

use async_lock::RwLock;
use async_trait::async_trait;
use reqwest::header::{LOCATION, RETRY_AFTER};
use reqwest::{redirect, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Low-level HTTP client for the platform REST API.
#[derive(Clone)]
pub struct PlatformHttp {
    base_url: String,
    client: Client,
    /// Same settings, but never follows redirects: status polls need to see the 303.
    status_client: Client,
    /// NEVER exposed publicly.
    auth_token: Arc<RwLock<Option<String>>>,
    max_retries: Option<u32>,
}

impl std::fmt::Debug for PlatformHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformHttp")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Connection settings for [`PlatformHttp::with_options`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub ssl_verify: bool,
    pub user_agent: String,
    pub max_retries: Option<u32>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs_f64(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            ssl_verify: true,
            user_agent: USER_AGENT.to_string(),
            max_retries: None,
        }
    }
}

impl HttpOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        let user_agent = match &config.user_agent_suffix {
            Some(suffix) if !suffix.is_empty() => format!("{} {}", USER_AGENT, suffix),
            _ => USER_AGENT.to_string(),
        };
        Self {
            connect_timeout: Duration::from_secs_f64(config.connect_timeout.max(0.0)),
            ssl_verify: config.ssl_verify,
            user_agent,
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

impl PlatformHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::with_options(base_url, HttpOptions::default())
    }

    pub fn with_options(base_url: &str, options: HttpOptions) -> Result<Self, HttpError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(&options, redirect::Policy::default())?,
            status_client: build_client(&options, redirect::Policy::none())?,
            auth_token: Arc::new(RwLock::new(None)),
            max_retries: options.max_retries,
        })
    }

    /// Use `token` for every request.
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Arc::new(RwLock::new(Some(token.to_string())));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    pub async fn has_auth_token(&self) -> bool {
        self.auth_token.read().await.is_some()
    }

    /// Absolute URLs (server-supplied `next` links, `Location` headers) are
    /// used verbatim; anything else is joined onto the endpoint.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let url = with_query(&self.url(path), params)?;
        let resp = self
            .request_with_retry(&self.client, Method::GET, &url, None, retry)
            .await?;
        decode(resp).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let url = self.url(path);
        let resp = self
            .request_with_retry(&self.client, Method::POST, &url, Some(body), retry)
            .await?;
        decode(resp).await
    }

    async fn request_with_retry(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        body: Option<&Value>,
        retry: RetryPolicy,
    ) -> Result<Response, HttpError> {
        let Some(config) = retry.config(self.max_retries) else {
            return self.do_request(client, &method, url, body).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request(client, &method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let delay = match retry_delay(&config, attempt, &e) {
                        Some(delay) if attempt < config.max_retries => delay,
                        _ => return Err(e),
                    };
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying {} {}: {}",
                        method,
                        url,
                        e
                    );
                    futures_timer::Delay::new(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request(
        &self,
        client: &Client,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, HttpError> {
        let mut req = client.request(method.clone(), url);

        if let Some(token) = self.auth_token.read().await.as_ref() {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;
        let status = resp.status();

        if status.is_success() || status.is_redirection() {
            return Ok(resp);
        }

        let retry_after_ms = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body_text = resp.text().await.unwrap_or_default();

        Err(match status.as_u16() {
            401 | 403 => HttpError::Unauthorized,
            404 => HttpError::NotFound(body_text),
            429 => HttpError::RateLimited { retry_after_ms },
            400..=499 => HttpError::BadRequest(body_text),
            code => HttpError::ServerError {
                status: code,
                body: body_text,
            },
        })
    }
}

fn build_client(options: &HttpOptions, policy: redirect::Policy) -> Result<Client, HttpError> {
    if !options.ssl_verify {
        tracing::warn!("TLS certificate verification disabled");
    }
    let client = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .pool_max_idle_per_host(10)
        .user_agent(options.user_agent.as_str())
        .redirect(policy)
        .danger_accept_invalid_certs(!options.ssl_verify)
        .build()?;
    Ok(client)
}

/// `None` when `err` is not worth retrying under `config`.
///
/// Transport failures retry only when the request never reached the server
/// (connect) or ran out of time. Malformed requests fail on the first attempt.
fn retry_delay(config: &RetryConfig, attempt: u32, err: &HttpError) -> Option<Duration> {
    match err {
        HttpError::ServerError { status, .. } if config.retryable_statuses.contains(status) => {
            Some(config.delay_for_attempt(attempt))
        }
        HttpError::RateLimited { retry_after_ms } if config.retryable_statuses.contains(&429) => {
            Some(config.rate_limit_delay(attempt, *retry_after_ms))
        }
        HttpError::Timeout => Some(config.delay_for_attempt(attempt)),
        HttpError::Reqwest(re) if (re.is_connect() && !re.is_builder()) || re.is_timeout() => {
            Some(config.delay_for_attempt(attempt))
        }
        _ => None,
    }
}

fn with_query(url: &str, params: &[(String, String)]) -> Result<String, HttpError> {
    if params.is_empty() {
        return Ok(url.to_string());
    }
    let query = serde_urlencoded::to_string(params)
        .map_err(|e| HttpError::BadRequest(format!("unencodable query: {}", e)))?;
    let sep = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", url, sep, query))
}

/// Decode a JSON body; an empty body decodes as `null`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, HttpError> {
    let text = resp.text().await?;
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| HttpError::UnexpectedResponse(e.to_string()))
}

fn location(resp: &Response) -> Result<String, HttpError> {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            HttpError::UnexpectedResponse(format!(
                "{} response without a Location header",
                resp.status()
            ))
        })
}

#[async_trait]
impl Transport for PlatformHttp {
    async fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value, HttpError> {
        self.get(url, params, RetryPolicy::Idempotent).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, HttpError> {
        self.post(url, body, RetryPolicy::None).await
    }

    async fn post_for_location(&self, url: &str, body: &Value) -> Result<String, HttpError> {
        let url = self.url(url);
        let resp = self
            .request_with_retry(&self.client, Method::POST, &url, Some(body), RetryPolicy::None)
            .await?;
        location(&resp)
    }

    async fn poll_status(&self, url: &str) -> Result<StatusPoll, HttpError> {
        let url = self.url(url);
        let resp = self
            .request_with_retry(
                &self.status_client,
                Method::GET,
                &url,
                None,
                RetryPolicy::Idempotent,
            )
            .await?;
        if resp.status() == StatusCode::SEE_OTHER {
            return Ok(StatusPoll::Finished {
                location: location(&resp)?,
            });
        }
        Ok(StatusPoll::Pending(decode(resp).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_relative_paths() {
        let http = PlatformHttp::new("https://host/api/v2/").unwrap();
        assert_eq!(http.url("projects/"), "https://host/api/v2/projects/");
        assert_eq!(http.url("/projects/"), "https://host/api/v2/projects/");
        assert_eq!(
            http.url("https://other/api/v2/projects/?page=2"),
            "https://other/api/v2/projects/?page=2"
        );
    }

    #[test]
    fn test_with_query_encodes_and_appends() {
        let params = vec![
            ("limit".to_string(), "10".to_string()),
            ("q".to_string(), "a b&c".to_string()),
        ];
        assert_eq!(
            with_query("https://h/items/", &params).unwrap(),
            "https://h/items/?limit=10&q=a+b%26c"
        );
        assert_eq!(
            with_query("https://h/items/?x=1", &params[..1]).unwrap(),
            "https://h/items/?x=1&limit=10"
        );
        assert_eq!(with_query("https://h/items/", &[]).unwrap(), "https://h/items/");
    }

    #[test]
    fn test_user_agent_suffix() {
        let mut config = ClientConfig::new("https://h", "t");
        config.user_agent_suffix = Some("my-app/1.0".into());
        let options = HttpOptions::from_config(&config);
        assert!(options.user_agent.starts_with("mlplatform-sdk-rust/"));
        assert!(options.user_agent.ends_with(" my-app/1.0"));
    }

    #[test]
    fn test_retry_delay_classification() {
        let config = RetryConfig::idempotent();
        let server = HttpError::ServerError {
            status: 503,
            body: String::new(),
        };
        assert!(retry_delay(&config, 0, &server).is_some());

        let internal = HttpError::ServerError {
            status: 500,
            body: String::new(),
        };
        assert!(retry_delay(&config, 0, &internal).is_none());
        assert!(retry_delay(&config, 0, &HttpError::Unauthorized).is_none());
        let limited = HttpError::RateLimited {
            retry_after_ms: Some(10),
        };
        assert!(retry_delay(&config, 0, &limited).is_some());
    }

    #[test]
    fn test_malformed_request_is_not_retried() {
        let err = Client::new().get("not a url").build().unwrap_err();
        assert!(err.is_builder());
        let config = RetryConfig::idempotent();
        assert!(retry_delay(&config, 0, &HttpError::Reqwest(err)).is_none());
    }

    #[tokio::test]
    async fn test_refused_connection_is_retried() {
        let err = Client::new().get("http://127.0.0.1:1/").send().await.unwrap_err();
        assert!(err.is_connect());
        let config = RetryConfig::idempotent();
        assert!(retry_delay(&config, 0, &HttpError::Reqwest(err)).is_some());
    }

    #[test]
    fn test_client_builds_with_verification_disabled() {
        let options = HttpOptions {
            ssl_verify: false,
            ..HttpOptions::default()
        };
        assert!(build_client(&options, redirect::Policy::none()).is_ok());
        assert!(build_client(&HttpOptions::default(), redirect::Policy::limited(10)).is_ok());
    }
}
