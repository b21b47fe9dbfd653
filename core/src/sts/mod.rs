//! STS client module
//!
//! Fetches the runner's OIDC token and exchanges it with the STS for a scoped token.

pub mod endpoint;
pub mod exchange;
pub mod identity;
pub mod retry;

pub use endpoint::{build_exchange_url, build_identity_url};
pub use exchange::{exchange, format_expiry, ExchangeResult, TokenInstallation};
pub use identity::fetch_identity_token;
pub use retry::{fetch_with_retry, RetryPolicy};
