//! HTTP GET with bounded exponential backoff

use rand::Rng;
use std::time::Duration;

use crate::config::{BACKOFF_BASE, BACKOFF_MAX_DELAY, BACKOFF_MAX_JITTER};
use crate::error::{ActionError, Result};
use crate::platform::{HttpClient, HttpResponse, Sleeper};

/// Retry bounds for a single endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first one
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    /// Delay after failed try `attempt` (1-based): `min(2^attempt * base + jitter, max_delay)`
    pub fn delay(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    fn random_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: crate::config::EXCHANGE_ATTEMPTS,
            base_delay: BACKOFF_BASE,
            max_jitter: BACKOFF_MAX_JITTER,
            max_delay: BACKOFF_MAX_DELAY,
        }
    }
}

/// Issue a GET, retrying transport failures and non-2xx statuses.
///
/// The first successful response is returned untouched. After the last failed try the error
/// carries the final failure, including the response body when there was one.
pub async fn fetch_with_retry(
    url: &str,
    headers: &[(&str, &str)],
    policy: &RetryPolicy,
    http: &dyn HttpClient,
    sleeper: &dyn Sleeper,
) -> Result<HttpResponse> {
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match try_once(url, headers, http).await {
            Ok(response) => return Ok(response),
            Err(message) => {
                tracing::warn!(attempt, attempts, error = %message, "attempt failed");
                last_error = message;
            }
        }

        if attempt < attempts {
            let delay = policy.delay(attempt, policy.random_jitter());
            tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off");
            sleeper.sleep(delay).await;
        }
    }

    Err(ActionError::retries_exhausted(attempts, last_error))
}

async fn try_once(
    url: &str,
    headers: &[(&str, &str)],
    http: &dyn HttpClient,
) -> std::result::Result<HttpResponse, String> {
    let response = http.get(url, headers).await.map_err(|e| e.to_string())?;
    if response.is_success() {
        return Ok(response);
    }

    let body = String::from_utf8_lossy(&response.body);
    Err(format!("HTTP {}: {}", response.status, body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockHttp, MockReply, MockSleeper};

    fn no_jitter(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::with_attempts(attempts)
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1, Duration::ZERO), Duration::from_millis(2000));
        assert_eq!(policy.delay(2, Duration::ZERO), Duration::from_millis(4000));
        assert_eq!(policy.delay(3, Duration::ZERO), Duration::from_millis(8000));
        assert_eq!(policy.delay(4, Duration::ZERO), Duration::from_millis(10_000));
        assert_eq!(
            policy.delay(1, Duration::from_millis(4999)),
            Duration::from_millis(6999)
        );
        assert_eq!(
            policy.delay(3, Duration::from_millis(5000)),
            Duration::from_millis(10_000)
        );
        assert_eq!(policy.delay(40, Duration::ZERO), Duration::from_millis(10_000));
    }

    #[test]
    fn test_random_jitter_is_bounded() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            assert!(policy.random_jitter() <= BACKOFF_MAX_JITTER);
        }
        assert_eq!(no_jitter(3).random_jitter(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_succeeds_after_two_retries() {
        let http = MockHttp::new().route(
            "/thing",
            vec![
                MockReply::text(503, "unavailable"),
                MockReply::TransportError("connection reset".into()),
                MockReply::text(200, "ok"),
            ],
        );
        let sleeper = MockSleeper::new();

        let response = fetch_with_retry("https://x/thing", &[], &no_jitter(3), &http, &sleeper)
            .await
            .unwrap();

        assert_eq!(response.text().unwrap(), "ok");
        assert_eq!(http.requests().len(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let http = MockHttp::new().route("/thing", vec![MockReply::text(201, "created")]);
        let sleeper = MockSleeper::new();

        let response = fetch_with_retry("https://x/thing", &[], &no_jitter(5), &http, &sleeper)
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(http.requests().len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_exhausts_after_configured_attempts() {
        let http = MockHttp::new().route("/thing", vec![MockReply::text(500, "boom\n")]);
        let sleeper = MockSleeper::new();

        let err = fetch_with_retry("https://x/thing", &[], &no_jitter(3), &http, &sleeper)
            .await
            .unwrap_err();

        assert_eq!(http.requests().len(), 3);
        assert_eq!(sleeper.delays().len(), 2);
        match err {
            ActionError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "HTTP 500: boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_headers_forwarded_on_every_attempt() {
        let http = MockHttp::new().route(
            "/thing",
            vec![MockReply::text(502, ""), MockReply::text(200, "{}")],
        );
        let sleeper = MockSleeper::new();

        fetch_with_retry(
            "https://x/thing",
            &[("Authorization", "Bearer abc")],
            &no_jitter(3),
            &http,
            &sleeper,
        )
        .await
        .unwrap();

        for request in http.requests() {
            assert_eq!(request.header("authorization"), Some("Bearer abc"));
        }
    }
}
