//! Error types for the token exchange step

use thiserror::Error;

/// Result type alias for action operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Action error, grouped by how the step reacts to it
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{message}")]
    InvalidConfig { message: String },

    #[error("upstream error: {message}")]
    Upstream { message: String },

    #[error("fetch failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("{message}")]
    Exchange { message: String },

    #[error("invalid token: {message}")]
    InvalidToken { message: String },

    #[error("io error: {message}")]
    Io { message: String },
}

impl ActionError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn retries_exhausted(attempts: u32, last_error: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            attempts,
            last_error: last_error.into(),
        }
    }

    pub fn exchange(message: impl Into<String>) -> Self {
        Self::Exchange {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "invalid_config",
            Self::Upstream { .. } => "upstream_error",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Exchange { .. } => "exchange_failed",
            Self::InvalidToken { .. } => "invalid_token",
            Self::Io { .. } => "io_error",
        }
    }
}
