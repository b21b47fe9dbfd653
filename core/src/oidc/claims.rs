//! Unverified claim extraction

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};

use crate::error::{ActionError, Result};

/// Claims carried by the runner's identity token, kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims(Map<String, Value>);

impl IdentityClaims {
    /// Subject claim (e.g. `repo:acme/widgets:ref:refs/heads/main`)
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Two-space indented JSON
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Single-line JSON
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Decode the claims segment of a JWT without verifying its signature
pub fn decode_unverified_claims(token: &str) -> Result<IdentityClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ActionError::invalid_token("invalid JWT format"));
    }

    let payload = base64_url_decode(parts[1])?;
    let claims: Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|e| ActionError::invalid_token(format!("invalid JWT claims: {}", e)))?;

    Ok(IdentityClaims(claims))
}

/// Base64 URL decode, with or without padding
fn base64_url_decode(input: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| {
            use base64::engine::general_purpose::URL_SAFE;
            URL_SAFE.decode(input)
        })
        .map_err(|e| ActionError::invalid_token(format!("invalid base64: {}", e)))
}
