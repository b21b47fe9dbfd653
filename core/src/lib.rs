//! octo-sts-action-core: Platform-agnostic core of the Octo STS CI step
//!
//! Exchanges the CI runner's OIDC identity token for a short-lived token issued by an Octo STS
//! deployment, through either the legacy scoped endpoint or the pool endpoint. Depends only on
//! abstract platform traits (HttpClient, Sleeper, Environment) and never on a concrete HTTP stack.

pub mod actions;
pub mod config;
pub mod error;
pub mod oidc;
pub mod platform;
pub mod step;
pub mod sts;

#[cfg(test)]
pub mod test_support;
