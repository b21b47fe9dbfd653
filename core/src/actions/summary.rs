//! Job summary written when the exchange fails

use crate::config::{Config, EndpointMode, PoolScope, PoolSelector, DEBUG_CLI, DEBUG_TOKEN_ENV};
use crate::oidc::IdentityClaims;

/// Command that reproduces the policy check locally with the debug CLI
pub fn debug_command(config: &Config) -> String {
    match &config.mode {
        EndpointMode::Legacy { scope } => {
            format!(
                "{} check -s {} -p {}",
                DEBUG_CLI,
                quote_arg(scope),
                quote_arg(&config.policy)
            )
        }
        EndpointMode::Pool { selector, scope } => {
            let mut args = vec![DEBUG_CLI.to_string(), "check-pool".to_string()];
            match selector {
                PoolSelector::Name(name) => args.push(format!("-pool {}", quote_arg(name))),
                PoolSelector::ApplicationId(id) => args.push(format!("-app {}", quote_arg(id))),
            }
            match scope {
                PoolScope::Enterprise(enterprise) => {
                    args.push(format!("-scope-enterprise {}", quote_arg(enterprise)))
                }
                PoolScope::Organization(organization) => {
                    args.push(format!("-scope-org {}", quote_arg(organization)))
                }
                PoolScope::Repository {
                    organization,
                    repository,
                } => {
                    args.push(format!("-scope-org {}", quote_arg(organization)));
                    args.push(format!("-scope-repo {}", quote_arg(repository)));
                }
            }
            args.push(format!("-p {}", quote_arg(&config.policy)));
            args.join(" ")
        }
    }
}

/// Quote a command argument only when it holds characters a shell would interpret
fn quote_arg(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'));
    if plain {
        value.to_string()
    } else {
        shell_quote(value)
    }
}

/// Wrap a value in single quotes for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Markdown block with the decoded claims and a ready-to-run debug command
pub fn failure_summary(config: &Config, claims: &IdentityClaims) -> String {
    [
        "### ⚠️ DD Octo STS request failed".to_string(),
        String::new(),
        "OIDC token claims for debugging:".to_string(),
        String::new(),
        "```json".to_string(),
        claims.to_pretty_json(),
        "```".to_string(),
        String::new(),
        format!("For local debugging via `{}` cli, run:", DEBUG_CLI),
        "```shell".to_string(),
        format!("{}={} \\", DEBUG_TOKEN_ENV, shell_quote(&claims.to_compact_json())),
        debug_command(config),
        "```".to_string(),
    ]
    .join("\n")
}
