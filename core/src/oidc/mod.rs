//! OIDC token inspection
//!
//! The STS verifies identity tokens; this side only reads their claims for diagnostics.

mod claims;

pub use claims::{decode_unverified_claims, IdentityClaims};
