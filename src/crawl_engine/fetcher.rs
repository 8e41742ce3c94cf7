//! Bounded-retry HTTP fetching with streamed bodies and size caps.
//!
//! Both the page crawler and the asset resolver fetch through this module.
//! Failures are classified as transient (worth retrying: timeouts,
//! connection resets, 5xx, rate limiting) or permanent (4xx, malformed
//! URLs); transient failures are retried with exponential backoff up to a
//! bounded attempt count, after which the typed error surfaces to the
//! caller. Callers treat an exhausted fetch as skip-and-continue; nothing
//! in this module aborts a run.

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Typed fetch failure.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Worth retrying: the condition may clear on its own.
    #[error("transient fetch failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// Retrying cannot help: the server or the URL itself rejects us.
    #[error("permanent fetch failure for {url}: {reason}")]
    Permanent { url: String, reason: String },
}

impl FetchError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

/// Retry schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied per retry for exponential backoff.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retrying after the given 0-based failed attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (self.initial_delay.as_millis() as f64 * multiplier) as u64;
        let delay = Duration::from_millis(delay_ms);
        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Fetch a URL, retrying transient failures per the policy.
///
/// The response body is streamed into memory with `max_bytes` enforced both
/// from the declared `Content-Length` and during accumulation, so a lying or
/// unbounded server cannot balloon the process.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    max_bytes: usize,
) -> Result<FetchedBody, FetchError> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error: Option<FetchError> = None;

    for attempt in 0..attempts {
        match fetch_once(client, url, max_bytes).await {
            Ok(body) => return Ok(body),
            Err(err) => {
                if err.is_transient() && attempt + 1 < attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    log::debug!(
                        "retrying {url} after transient failure (attempt {}/{attempts}): {err}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }
        }
    }

    // Unreachable with attempts >= 1, but keep the typed error shape rather
    // than panic if the loop structure ever changes.
    Err(last_error.unwrap_or_else(|| FetchError::Permanent {
        url: url.to_string(),
        reason: "no fetch attempts were made".to_string(),
    }))
}

/// One fetch attempt: request, classify the status, stream the body.
async fn fetch_once(
    client: &Client,
    url: &str,
    max_bytes: usize,
) -> Result<FetchedBody, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_request_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(classify_status(url, status));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    // Enforce the cap before downloading when the server declares a length.
    let expected = response.content_length().unwrap_or(0);
    if expected > max_bytes as u64 {
        return Err(FetchError::Permanent {
            url: url.to_string(),
            reason: format!("declared body of {expected} bytes exceeds cap of {max_bytes}"),
        });
    }

    let mut buffer = if expected > 0 {
        Vec::with_capacity(expected as usize)
    } else {
        Vec::new()
    };

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Transient {
            url: url.to_string(),
            reason: format!("body read failed: {e}"),
        })?;

        // Check before accumulating: the declared length is advisory.
        if buffer.len() + chunk.len() > max_bytes {
            return Err(FetchError::Permanent {
                url: url.to_string(),
                reason: format!("body exceeded cap of {max_bytes} bytes during download"),
            });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(FetchedBody {
        bytes: buffer,
        content_type,
    })
}

/// HTTP status → error taxonomy.
///
/// 5xx and 429 are transient; every other non-success status is permanent.
fn classify_status(url: &str, status: StatusCode) -> FetchError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::Transient {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        }
    } else {
        FetchError::Permanent {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        }
    }
}

/// reqwest-level failures: network-ish problems retry, structural ones
/// (bad URL, builder misuse) do not.
fn classify_request_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_builder() || err.is_request() {
        FetchError::Permanent {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        FetchError::Transient {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        // 400ms computed, capped at 350ms.
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
    }

    #[test]
    fn status_classification_matches_taxonomy() {
        assert!(classify_status("u", StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(classify_status("u", StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!classify_status("u", StatusCode::NOT_FOUND).is_transient());
        assert!(!classify_status("u", StatusCode::FORBIDDEN).is_transient());
    }
}
