//! Step orchestration
//!
//! Fetches the runner identity token, exchanges it, and publishes the issued token. A failed
//! exchange leaves a diagnostic summary behind before the error is returned.

use sha2::{Digest, Sha256};

use crate::actions::{commands, summary, RunnerFiles};
use crate::config::Config;
use crate::error::Result;
use crate::oidc::decode_unverified_claims;
use crate::platform::{HttpClient, Sleeper};
use crate::sts::{self, format_expiry, ExchangeResult};

/// Run the step end to end
pub async fn run(config: &Config, http: &dyn HttpClient, sleeper: &dyn Sleeper) -> Result<ExchangeResult> {
    let files = RunnerFiles::new(config.paths.clone());

    // 1. Runner identity token
    tracing::info!(audience = %config.audience, "requesting identity token");
    let identity_token = sts::fetch_identity_token(config, http, sleeper).await?;

    // 2. Exchange, leaving diagnostics behind on failure
    let result = match sts::exchange(config, &identity_token, http, sleeper).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, kind = e.error_key(), "token exchange failed");
            report_failure(config, &identity_token, &files);
            return Err(e);
        }
    };

    // 3. Mask and publish
    publish(&result, &files)?;

    Ok(result)
}

/// Write decoded claims and a local debug command to the job summary
fn report_failure(config: &Config, identity_token: &str, files: &RunnerFiles) {
    let claims = match decode_unverified_claims(identity_token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "could not decode identity token claims");
            return;
        }
    };

    tracing::info!(
        subject = claims.subject().unwrap_or_default(),
        "JWT claims:\n{}",
        claims.to_pretty_json()
    );

    match files.append_summary(&summary::failure_summary(config, &claims)) {
        Ok(true) => {}
        Ok(false) => tracing::warn!("GITHUB_STEP_SUMMARY is not set; skipping job summary"),
        Err(e) => tracing::warn!(error = %e, "failed to write job summary"),
    }
}

/// Hex SHA-256 of the token, safe to log for correlation
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn publish(result: &ExchangeResult, files: &RunnerFiles) -> Result<()> {
    let token = result.token();
    commands::add_mask(token);
    tracing::info!(token_hash = %token_hash(token), "token issued");

    let state = [("token", token)];
    match result {
        ExchangeResult::LegacyToken(_) => files.publish(&[("token", token)], &state),
        ExchangeResult::PoolToken {
            expires_at,
            installation,
            ..
        } => {
            let expires_at = expires_at.as_ref().map(format_expiry).unwrap_or_default();
            let installation = installation.clone().unwrap_or_default();
            let application_id = installation.application_id.unwrap_or_default();
            let application_name = installation.application_name.unwrap_or_default();

            tracing::info!(
                application_id = %application_id,
                application_name = %application_name,
                expires_at = %expires_at,
                "pool token details"
            );

            files.publish(
                &[
                    ("token", token),
                    ("expires_at", expires_at.as_str()),
                    ("application_id", application_id.as_str()),
                    ("application_name", application_name.as_str()),
                ],
                &state,
            )
        }
    }
}
