//! Credential strategy selection
//!
//! Pure decision logic over bootstrap settings; no network calls.

use crate::config::{ConfigError, ConfigResult};
use crate::settings::{keys, BootstrapSettings};

/// How to authenticate against Vault
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Send a pre-issued token with every request
    Token(String),
    /// Exchange a username and password for a session token
    UserPass { username: String, password: String },
}

impl CredentialStrategy {
    /// Short name of the auth method
    pub fn method(&self) -> &'static str {
        match self {
            CredentialStrategy::Token(_) => "token",
            CredentialStrategy::UserPass { .. } => "userpass",
        }
    }
}

impl std::fmt::Debug for CredentialStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStrategy::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            CredentialStrategy::UserPass { username, .. } => f
                .debug_struct("UserPass")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Pick a credential strategy from the bootstrap settings
///
/// - token only: `Token`
/// - username and password: `UserPass`
/// - token plus a complete username/password pair: `AmbiguousCredentials`
/// - anything else: `MissingAuth`
pub fn resolve_credentials(settings: &BootstrapSettings) -> ConfigResult<CredentialStrategy> {
    let token = settings.get(keys::VAULT_TOKEN);
    let username = settings.get(keys::VAULT_USERNAME);
    let password = settings.get(keys::VAULT_PASSWORD);

    match (token, username, password) {
        (Some(_), Some(_), Some(_)) => Err(ConfigError::AmbiguousCredentials),
        (Some(token), _, _) => Ok(CredentialStrategy::Token(token.to_string())),
        (None, Some(username), Some(password)) => Ok(CredentialStrategy::UserPass {
            username: username.to_string(),
            password: password.to_string(),
        }),
        (None, Some(_), None) => Err(ConfigError::MissingAuth(format!(
            "{} is set but {} is not",
            keys::VAULT_USERNAME,
            keys::VAULT_PASSWORD
        ))),
        (None, None, Some(_)) => Err(ConfigError::MissingAuth(format!(
            "{} is set but {} is not",
            keys::VAULT_PASSWORD,
            keys::VAULT_USERNAME
        ))),
        (None, None, None) => Err(ConfigError::MissingAuth(format!(
            "set {} or both {} and {}",
            keys::VAULT_TOKEN,
            keys::VAULT_USERNAME,
            keys::VAULT_PASSWORD
        ))),
    }
}
