//! Runner OIDC token retrieval

use serde::Deserialize;

use super::endpoint::build_identity_url;
use super::retry::{fetch_with_retry, RetryPolicy};
use crate::config::{Config, IDENTITY_FETCH_ATTEMPTS};
use crate::error::{ActionError, Result};
use crate::platform::{HttpClient, Sleeper};

/// Body returned by the runner's token request endpoint
#[derive(Deserialize)]
struct IdentityTokenResponse {
    value: Option<String>,
}

/// Request an audience-scoped OIDC token from the runner
pub async fn fetch_identity_token(
    config: &Config,
    http: &dyn HttpClient,
    sleeper: &dyn Sleeper,
) -> Result<String> {
    let url = build_identity_url(&config.identity_request.url, &config.audience)?;
    let auth_header = format!("Bearer {}", config.identity_request.token);
    let headers = [
        ("Authorization", auth_header.as_str()),
        ("Accept", "application/json"),
        ("User-Agent", "octo-sts-action"),
    ];

    let response = fetch_with_retry(
        &url,
        &headers,
        &RetryPolicy::with_attempts(IDENTITY_FETCH_ATTEMPTS),
        http,
        sleeper,
    )
    .await?;

    let body: IdentityTokenResponse = response
        .json()
        .map_err(|e| ActionError::upstream(format!("invalid identity token response: {}", e)))?;

    body.value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ActionError::upstream("identity token response did not include a value"))
}
