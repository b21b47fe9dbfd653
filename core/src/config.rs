//! Step configuration loaded from the runner environment

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ActionError, Result};
use crate::platform::{optional_var, required_var, Environment};

/// Attempts made against the CI identity endpoint
pub const IDENTITY_FETCH_ATTEMPTS: u32 = 5;

/// Attempts made against the STS exchange endpoint
pub const EXCHANGE_ATTEMPTS: u32 = 3;

/// Backoff base, doubled per failed attempt
pub const BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Upper bound of the random jitter added to each backoff delay
pub const BACKOFF_MAX_JITTER: Duration = Duration::from_millis(5000);

/// Upper bound of any single backoff delay
pub const BACKOFF_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Routing header required by the STS ingress
pub const ROUTING_HEADER: (&str, &str) = ("x-datadog-target-release", "dd-octo-sts.dd-octo-sts");

/// CLI used for local reproduction of a failed exchange
pub const DEBUG_CLI: &str = "dd-octo-sts";

/// Environment variable the debug CLI reads the identity claims from
pub const DEBUG_TOKEN_ENV: &str = "DDOCTOSTS_ID_TOKEN";

/// Endpoint used to obtain the runner's OIDC token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    pub url: String,
    pub token: String,
}

/// Which STS endpoint the exchange goes through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointMode {
    /// `/sts/exchange`, keyed by a flat `owner` or `owner/repo` scope
    Legacy { scope: String },
    /// `/sts/pool/exchange`, keyed by a pool selector and an installation scope
    Pool {
        selector: PoolSelector,
        scope: PoolScope,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelector {
    Name(String),
    ApplicationId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolScope {
    Enterprise(String),
    Organization(String),
    Repository {
        organization: String,
        repository: String,
    },
}

/// Files the runner reads back after the step finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerPaths {
    pub output: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// Validated step configuration. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub identity_request: IdentityRequest,
    /// STS host (e.g., "octo-sts.example.com")
    pub domain: String,
    /// Audience requested for the runner's OIDC token
    pub audience: String,
    /// Trust policy name evaluated by the STS
    pub policy: String,
    pub mode: EndpointMode,
    pub paths: RunnerPaths,
}

impl Config {
    /// Load configuration from the runner environment, failing on the first invalid input
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let request_token = optional_var(env, "ACTIONS_ID_TOKEN_REQUEST_TOKEN");
        let request_url = optional_var(env, "ACTIONS_ID_TOKEN_REQUEST_URL");
        let identity_request = match (request_token, request_url) {
            (Some(token), Some(url)) => IdentityRequest { url, token },
            _ => {
                return Err(ActionError::invalid_config(
                    "Missing required environment variables; have you set 'id-token: write' in your workflow permissions?",
                ))
            }
        };

        let policy = required_var(env, "INPUT_POLICY", "Missing required input 'policy'")?;
        let domain = required_var(env, "INPUT_DOMAIN", "Missing required input 'domain'")?;
        let audience = required_var(env, "INPUT_AUDIENCE", "Missing required input 'audience'")?;

        let mode = resolve_mode(
            optional_var(env, "INPUT_SCOPE"),
            optional_var(env, "INPUT_POOL_NAME"),
            optional_var(env, "INPUT_APPLICATION_ID"),
            optional_var(env, "INPUT_SCOPE_ENTERPRISE"),
            optional_var(env, "INPUT_SCOPE_ORGANIZATION"),
        )?;

        let paths = RunnerPaths {
            output: optional_var(env, "GITHUB_OUTPUT").map(PathBuf::from),
            state: optional_var(env, "GITHUB_STATE").map(PathBuf::from),
            summary: optional_var(env, "GITHUB_STEP_SUMMARY").map(PathBuf::from),
        };

        Ok(Self {
            identity_request,
            domain,
            audience,
            policy,
            mode,
            paths,
        })
    }
}

/// Pick the endpoint mode. A pool name or application id selects the pool endpoint.
fn resolve_mode(
    scope: Option<String>,
    pool_name: Option<String>,
    application_id: Option<String>,
    scope_enterprise: Option<String>,
    scope_organization: Option<String>,
) -> Result<EndpointMode> {
    let selector = match (pool_name, application_id) {
        (Some(_), Some(_)) => {
            return Err(ActionError::invalid_config(
                "Cannot specify both 'pool_name' and 'application_id'",
            ))
        }
        (Some(name), None) => PoolSelector::Name(name),
        (None, Some(id)) => PoolSelector::ApplicationId(id),
        (None, None) => {
            let scope = scope.ok_or_else(|| {
                ActionError::invalid_config("Missing required input 'scope' for legacy endpoint")
            })?;
            validate_scope(&scope)?;
            return Ok(EndpointMode::Legacy { scope });
        }
    };

    // 'scope_organization' is the older spelling of an org-only 'scope'
    let scope = match (scope, scope_organization) {
        (Some(_), Some(_)) => {
            return Err(ActionError::invalid_config(
                "Cannot specify both 'scope' and 'scope_organization'",
            ))
        }
        (scope, organization) => scope.or(organization),
    };

    let scope = match (scope, scope_enterprise) {
        (Some(_), Some(_)) => {
            return Err(ActionError::invalid_config(
                "Cannot specify both 'scope' and 'scope_enterprise'",
            ))
        }
        (None, None) => {
            return Err(ActionError::invalid_config(
                "Pool endpoint requires 'scope' or 'scope_enterprise'",
            ))
        }
        (None, Some(enterprise)) => PoolScope::Enterprise(enterprise),
        (Some(scope), None) => {
            validate_scope(&scope)?;
            match scope.split_once('/') {
                Some((organization, repository)) => PoolScope::Repository {
                    organization: organization.to_string(),
                    repository: repository.to_string(),
                },
                None => PoolScope::Organization(scope),
            }
        }
    };

    Ok(EndpointMode::Pool { selector, scope })
}

/// Scope must be `owner` or `owner/repo`
pub fn validate_scope(scope: &str) -> Result<()> {
    if scope.matches('/').count() > 1 {
        return Err(ActionError::invalid_config(format!(
            "Invalid scope '{}': expected 'owner' or 'owner/repo'",
            scope
        )));
    }

    if scope.split('/').any(str::is_empty) {
        return Err(ActionError::invalid_config(format!(
            "Invalid scope '{}': owner and repository cannot be empty",
            scope
        )));
    }

    Ok(())
}
