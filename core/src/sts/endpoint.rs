//! Exchange and identity request URLs

use url::Url;

use crate::config::{Config, EndpointMode, PoolScope, PoolSelector};
use crate::error::{ActionError, Result};

/// Build the STS exchange URL for the configured endpoint mode
pub fn build_exchange_url(config: &Config) -> Result<String> {
    let path = match config.mode {
        EndpointMode::Legacy { .. } => "/sts/exchange",
        EndpointMode::Pool { .. } => "/sts/pool/exchange",
    };
    let mut url = Url::parse(&format!("https://{}{}", config.domain, path))
        .map_err(|e| ActionError::invalid_config(format!("invalid domain '{}': {}", config.domain, e)))?;

    {
        let mut query = url.query_pairs_mut();
        match &config.mode {
            EndpointMode::Legacy { scope } => {
                query.append_pair("scope", scope);
                query.append_pair("identity", &config.policy);
            }
            EndpointMode::Pool { selector, scope } => {
                query.append_pair("policy", &config.policy);

                match selector {
                    PoolSelector::Name(name) => query.append_pair("pool_name", name),
                    PoolSelector::ApplicationId(id) => query.append_pair("application_id", id),
                };

                match scope {
                    PoolScope::Enterprise(enterprise) => {
                        query.append_pair("scope_enterprise.enterprise", enterprise);
                    }
                    PoolScope::Repository {
                        organization,
                        repository,
                    } => {
                        query.append_pair("scope_repository.organization", organization);
                        query.append_pair("scope_repository.repository", repository);
                    }
                    PoolScope::Organization(organization) => {
                        query.append_pair("scope_organization.organization", organization);
                    }
                }
            }
        }
    }

    Ok(url.into())
}

/// Append the requested audience to the runner-issued identity request URL
pub fn build_identity_url(request_url: &str, audience: &str) -> Result<String> {
    let mut url = Url::parse(request_url).map_err(|e| {
        ActionError::invalid_config(format!("invalid ACTIONS_ID_TOKEN_REQUEST_URL: {}", e))
    })?;
    url.query_pairs_mut().append_pair("audience", audience);
    Ok(url.into())
}
