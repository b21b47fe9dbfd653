//! octo-sts-action: CI step that exchanges the runner's OIDC token for an Octo STS token
//!
//! Configuration comes from the runner environment (`INPUT_*`, `ACTIONS_ID_TOKEN_REQUEST_*`,
//! `GITHUB_*`). Uses a single-threaded tokio runtime (compatible with core's !Send async traits).

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use octo_sts_action_core::actions::commands;
use octo_sts_action_core::config::Config;
use octo_sts_action_core::step;

mod platform;

use platform::{ProcessEnv, ReqwestHttpClient, TokioSleeper};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    // Validation runs before any network call
    let config = match Config::from_env(&ProcessEnv) {
        Ok(config) => config,
        Err(e) => {
            commands::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let http = match ReqwestHttpClient::new() {
        Ok(http) => http,
        Err(e) => {
            commands::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    match step::run(&config, &http, &TokioSleeper).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "step failed");
            commands::error(&format!("{} ({})", e, e.error_key()));
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr without colors. `RUST_LOG` wins; otherwise the runner's debug flag decides.
fn init_tracing() {
    let default_level = match std::env::var("RUNNER_DEBUG").as_deref() {
        Ok("1") => "debug",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "octo_sts_action={level},octo_sts_action_core={level}",
            level = default_level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
