//! STS token exchange
//!
//! Trades the runner's OIDC token for a scoped token issued by the STS.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

use super::endpoint::build_exchange_url;
use super::retry::{fetch_with_retry, RetryPolicy};
use crate::config::{Config, EndpointMode, EXCHANGE_ATTEMPTS, ROUTING_HEADER};
use crate::error::{ActionError, Result};
use crate::platform::{HttpClient, HttpResponse, Sleeper};

/// Token issued by the STS
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeResult {
    /// Legacy endpoint: a bare token
    LegacyToken(String),
    /// Pool endpoint: token plus expiry and the installation that minted it
    PoolToken {
        token: String,
        expires_at: Option<DateTime<Utc>>,
        installation: Option<TokenInstallation>,
    },
}

impl ExchangeResult {
    pub fn token(&self) -> &str {
        match self {
            Self::LegacyToken(token) => token,
            Self::PoolToken { token, .. } => token,
        }
    }
}

/// GitHub App installation that backs a pool token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenInstallation {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub application_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub application_name: Option<String>,
}

#[derive(Deserialize)]
struct LegacyExchangeResponse {
    token: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct PoolExchangeResponse {
    token: Option<PoolTokenBody>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct PoolTokenBody {
    token: Option<String>,
    expires_seconds: Option<f64>,
    token_installation: Option<TokenInstallation>,
}

/// Accept a scalar sent as a JSON string, number or boolean
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(value.to_string()).filter(|v| !v.is_empty()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Exchange the identity token with the STS
pub async fn exchange(
    config: &Config,
    identity_token: &str,
    http: &dyn HttpClient,
    sleeper: &dyn Sleeper,
) -> Result<ExchangeResult> {
    let url = build_exchange_url(config)?;
    let auth_header = format!("Bearer {}", identity_token);
    let headers = [
        ("Authorization", auth_header.as_str()),
        ("Accept", "application/json"),
        ("User-Agent", "octo-sts-action"),
        ROUTING_HEADER,
    ];

    tracing::info!(url = %url, "exchanging identity token");
    let response = fetch_with_retry(
        &url,
        &headers,
        &RetryPolicy::with_attempts(EXCHANGE_ATTEMPTS),
        http,
        sleeper,
    )
    .await?;

    parse_exchange_response(&config.mode, &response)
}

/// Validate the exchange body for the given mode
pub fn parse_exchange_response(mode: &EndpointMode, response: &HttpResponse) -> Result<ExchangeResult> {
    match mode {
        EndpointMode::Legacy { .. } => {
            let body: LegacyExchangeResponse = response
                .json()
                .map_err(|e| ActionError::exchange(format!("invalid exchange response: {}", e)))?;
            match body.token.filter(|t| !t.is_empty()) {
                Some(token) => Ok(ExchangeResult::LegacyToken(token)),
                None => Err(ActionError::exchange(
                    body.message
                        .unwrap_or_else(|| "Exchange endpoint did not return a token".to_string()),
                )),
            }
        }
        EndpointMode::Pool { .. } => {
            let body: PoolExchangeResponse = response
                .json()
                .map_err(|e| ActionError::exchange(format!("invalid pool exchange response: {}", e)))?;
            let missing = || {
                ActionError::exchange(
                    body.message
                        .clone()
                        .unwrap_or_else(|| "Pool endpoint did not return a token".to_string()),
                )
            };
            let inner = body.token.as_ref().ok_or_else(missing)?;
            let token = inner
                .token
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or_else(missing)?;

            let expires_at = match inner.expires_seconds {
                Some(secs) if secs > 0.0 => Some(expiry_from_seconds(secs)?),
                _ => None,
            };

            Ok(ExchangeResult::PoolToken {
                token,
                expires_at,
                installation: inner.token_installation.clone(),
            })
        }
    }
}

/// Unix seconds, possibly fractional, to a UTC timestamp at millisecond precision
fn expiry_from_seconds(secs: f64) -> Result<DateTime<Utc>> {
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis > i64::MAX as f64 {
        return Err(ActionError::exchange(format!("expires_seconds out of range: {}", secs)));
    }
    DateTime::from_timestamp_millis(millis as i64)
        .ok_or_else(|| ActionError::exchange(format!("expires_seconds out of range: {}", secs)))
}

/// Format an expiry the way the runner's JavaScript tooling does (`2023-11-14T22:13:20.000Z`)
pub fn format_expiry(expires_at: &DateTime<Utc>) -> String {
    expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
