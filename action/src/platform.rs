//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest
//! - Sleeper: tokio timers
//! - Environment: std::env

use async_trait::async_trait;
use std::time::Duration;

use octo_sts_action_core::error::{ActionError, Result};
use octo_sts_action_core::platform::{Environment, HttpClient, HttpResponse, Sleeper};

/// Per-request timeout, so a stalled endpoint counts as a failed attempt
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-based HTTP client
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ActionError::upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ActionError::upstream(format!("HTTP GET failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ActionError::upstream(format!("failed to read response: {}", e)))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Backoff delays on the tokio timer
pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Process environment as exported by the runner
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ActionError::invalid_config(format!("environment variable '{}' not set", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_get_forwards_headers_and_returns_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sts/exchange")
            .match_query(Matcher::UrlEncoded("scope".into(), "acme".into()))
            .match_header("authorization", "Bearer id-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"abc"}"#)
            .create_async()
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .get(
                &format!("{}/sts/exchange?scope=acme", server.url()),
                &[("Authorization", "Bearer id-token")],
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text().unwrap(), r#"{"token":"abc"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/id")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client.get(&format!("{}/id", server.url()), &[]).await.unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let client = ReqwestHttpClient::new().unwrap();
        let err = client.get("http://127.0.0.1:1/unreachable", &[]).await.unwrap_err();
        assert_eq!(err.error_key(), "upstream_error");
    }

    #[test]
    fn test_process_env_missing_var() {
        let err = ProcessEnv
            .get_var("OCTO_STS_ACTION_TEST_SURELY_UNSET")
            .unwrap_err();
        assert!(err.to_string().contains("OCTO_STS_ACTION_TEST_SURELY_UNSET"));
    }
}
