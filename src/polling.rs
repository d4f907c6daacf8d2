//! Poll-until-terminal for long-running server jobs.
//!
//! An async endpoint answers a submission with `202 Accepted` and a status
//! location. The status resource reports `INITIALIZED`/`RUNNING` while the job
//! works, redirects (303) to the finished resource on success, and reports
//! `ERROR`/`ABORTED` on failure. Giving up locally never cancels the job.

use crate::error::SdkError;
use crate::transport::{StatusPoll, Transport};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Polling cadence and wait budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status requests.
    pub interval: Duration,
    /// Total time to wait before giving up with [`SdkError::AsyncTimeout`].
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(600),
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// How an async job finished.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncResolution {
    /// The status endpoint redirected to this resource URL.
    Redirect(String),
    /// The status endpoint itself returned the final payload.
    Completed(Value),
}

impl AsyncResolution {
    pub fn location(&self) -> Option<&str> {
        match self {
            AsyncResolution::Redirect(url) => Some(url),
            AsyncResolution::Completed(_) => None,
        }
    }
}

/// Job states reported by status resources.
const FAILED_STATUSES: &[&str] = &["ERROR", "ABORTED"];
const COMPLETED_STATUS: &str = "COMPLETED";

/// Poll `status_url` until the job finishes, fails, or the wait budget runs out.
///
/// Transport errors end the wait immediately.
pub async fn wait_for_async_resolution(
    transport: &dyn Transport,
    status_url: &str,
    config: &PollConfig,
) -> Result<AsyncResolution, SdkError> {
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match transport.poll_status(status_url).await? {
            StatusPoll::Finished { location } => {
                tracing::debug!(attempt, location = %location, "Async job finished");
                return Ok(AsyncResolution::Redirect(location));
            }
            StatusPoll::Pending(body) => {
                // A body without a status field is the finished resource.
                let Some(status) = body.get("status").and_then(Value::as_str) else {
                    return Ok(AsyncResolution::Completed(body));
                };
                let status = status.to_ascii_uppercase();
                if FAILED_STATUSES.contains(&status.as_str()) {
                    let message = body
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    return Err(SdkError::AsyncProcessUnsuccessful { status, message });
                }
                if status == COMPLETED_STATUS {
                    return Ok(AsyncResolution::Completed(body));
                }
                tracing::debug!(attempt, status = %status, "Async job still running");
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= config.max_wait {
            return Err(SdkError::AsyncTimeout {
                location: status_url.to_string(),
                waited_secs: elapsed.as_secs(),
            });
        }
        let remaining = config.max_wait - elapsed;
        futures_timer::Delay::new(config.interval.min(remaining)).await;
    }
}
