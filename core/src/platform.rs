//! Platform abstraction traits
//!
//! These traits define the boundary between the platform-agnostic exchange logic and the
//! native runner adapter (reqwest, tokio, process environment).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ActionError, Result};

/// HTTP client for outbound requests (CI identity endpoint, STS exchange endpoint)
///
/// A received response is always `Ok`, whatever its status. `Err` means the request never
/// produced a response.
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse body as UTF-8 string
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Suspends the current task between retry attempts
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Environment access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
}

/// Read an optional variable. Unset, empty and whitespace-only values are all `None`,
/// since the runner exports every declared input even when the workflow leaves it blank.
pub fn optional_var(env: &dyn Environment, name: &str) -> Option<String> {
    env.get_var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read a variable that must be present and non-blank
pub fn required_var(env: &dyn Environment, name: &str, message: &str) -> Result<String> {
    optional_var(env, name).ok_or_else(|| ActionError::invalid_config(message))
}
