//! Secret fetch error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a secret from Vault
///
/// Every variant is fatal to startup.
#[derive(Error, Debug)]
pub enum SecretFetchError {
    /// Connection or DNS failure
    #[error("Vault unreachable at {address}: {message}")]
    Unreachable { address: String, message: String },

    /// Credentials rejected during login or read
    #[error("Vault rejected credentials during {operation} (HTTP {status})")]
    Unauthorized { operation: &'static str, status: u16 },

    /// No secret at the requested location
    #[error("secret not found at '{path}' in mount '{mount}'")]
    NotFound { mount: String, path: String },

    /// The request did not complete in time
    #[error("Vault {operation} timed out after {}ms", .after.as_millis())]
    Timeout { operation: &'static str, after: Duration },

    /// Unexpected status or malformed body
    #[error("invalid response from Vault during {operation}: {message}")]
    InvalidResponse { operation: &'static str, message: String },
}

impl SecretFetchError {
    /// Create an invalid response error
    pub fn invalid_response(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation,
            message: message.into(),
        }
    }

    /// Short machine-readable cause
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Timeout { .. } => "timeout",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}

pub type SecretFetchResult<T> = Result<T, SecretFetchError>;
