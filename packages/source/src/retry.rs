//! HTTP retry helpers for upstream requests.
//!
//! Every upstream request goes through [`send_json`], which retries
//! network failures (connection errors, timeouts, non-2xx statuses) up to
//! [`MAX_RETRIES`] times with exponential backoff. Only the final failure
//! is surfaced; intermediate attempts are logged at `warn`.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(url.as_str())).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::SourceError;

/// Maximum number of retries after the first attempt.
///
/// With exponential backoff (1s, 2s) the total wait before giving up is
/// three seconds plus the time spent in the three attempts themselves.
pub const MAX_RETRIES: u32 = 2;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
#[must_use]
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(5))
}

/// Runs `operation` until it succeeds, fails with a non-network error, or
/// has been retried `max_retries` times.
///
/// `operation` receives the 0-based attempt number.
///
/// # Errors
///
/// Returns the last [`SourceError`] once the retry budget is exhausted,
/// or the first non-network error immediately.
pub async fn with_retries<T, F, Fut>(max_retries: u32, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_network() && attempt < max_retries => {
                attempt += 1;
                let delay = backoff(attempt);
                log::warn!("  {e}; retry {attempt}/{max_retries} in {delay:?}...");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (since builders are consumed by
/// `.send()`).
///
/// Body parse failures are not retried: the upstream answered, the
/// payload is simply not JSON.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after all retries or the
/// response body is not valid JSON.
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let text = with_retries(MAX_RETRIES, |_| send_once(&build_request)).await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview = text.chars().take(BODY_PREVIEW_LEN).collect::<String>();
        log::error!(
            "JSON parse failed: {e}\n  \
             received: {} bytes\n  \
             body preview: {preview}",
            text.len(),
        );
        SourceError::Json(e)
    })
}

async fn send_once<F>(build_request: &F) -> Result<String, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = build_request().send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn status_error() -> SourceError {
        SourceError::Status {
            status: 503,
            url: "https://example.test/ccvi/vulnerability".to_string(),
        }
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retry_budget() {
        let attempts = Cell::new(0);
        let result: Result<(), _> = with_retries(MAX_RETRIES, |_| {
            attempts.set(attempts.get() + 1);
            async { Err(status_error()) }
        })
        .await;

        assert!(matches!(result, Err(SourceError::Status { status: 503, .. })));
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_second_attempt() {
        let result = with_retries(MAX_RETRIES, |attempt| async move {
            if attempt == 0 {
                Err(status_error())
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_unknown_indicator() {
        let attempts = Cell::new(0);
        let result: Result<(), _> = with_retries(MAX_RETRIES, |_| {
            attempts.set(attempts.get() + 1);
            async {
                Err(SourceError::UnknownIndicator {
                    id: "nope".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(SourceError::UnknownIndicator { .. })));
        assert_eq!(attempts.get(), 1);
    }
}
