//! Minimal Vault HTTP client
//!
//! Covers the two auth handshakes and the KV v2 read used at startup:
//! - token: `X-Vault-Token` header on every request
//! - userpass: `POST /v1/auth/userpass/login/{username}` for a session token
//! - read: `GET /v1/{mount}/data/{path}`, payload at `data.data`

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::credentials::CredentialStrategy;
use super::document::SecretDocument;
use super::error::{SecretFetchError, SecretFetchResult};
use crate::config::{ConfigError, ConfigResult};
use crate::settings::keys;

/// Upper bound on any single Vault call during startup
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Mount used when none is configured (the KV v2 default)
pub const DEFAULT_MOUNT: &str = "secret";

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Where and how long to talk to Vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultClientSettings {
    pub address: Url,
    pub timeout: Duration,
}

impl VaultClientSettings {
    /// Parse a Vault address such as `https://vault.internal:8200`
    pub fn new(address: &str) -> ConfigResult<Self> {
        let url = Url::parse(address).map_err(|e| ConfigError::InvalidSetting {
            key: keys::VAULT_ADDRESS.to_string(),
            message: format!("'{}' is not a valid URL: {}", address, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidSetting {
                key: keys::VAULT_ADDRESS.to_string(),
                message: format!("'{}' must be an http or https URL", address),
            });
        }

        Ok(Self {
            address: url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Deserialize)]
struct KvReadData {
    #[serde(default)]
    data: Value,
}

/// Authenticated client for one Vault server
///
/// Construction does no I/O; the userpass login happens on the first read.
pub struct VaultClient {
    settings: VaultClientSettings,
    strategy: CredentialStrategy,
    http: reqwest::Client,
}

impl VaultClient {
    /// Create a client for the given server and credentials
    pub fn new(settings: VaultClientSettings, strategy: CredentialStrategy) -> SecretFetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SecretFetchError::Unreachable {
                address: settings.address.to_string(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            settings,
            strategy,
            http,
        })
    }

    pub fn settings(&self) -> &VaultClientSettings {
        &self.settings
    }

    /// Read the latest version of a KV v2 secret
    pub async fn read_secret(&self, mount: &str, path: &str) -> SecretFetchResult<SecretDocument> {
        let token = self.session_token().await?;

        let mut segments = split_path(mount);
        segments.push("data");
        segments.extend(split_path(path));
        let url = self.endpoint(&segments)?;

        debug!(mount, path, "reading secret from Vault");

        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| self.transport_error("read", e))?;

        match response.status().as_u16() {
            200 => {}
            404 => return Err(not_found(mount, path)),
            status @ (401 | 403) => {
                return Err(SecretFetchError::Unauthorized {
                    operation: "read",
                    status,
                });
            }
            status => {
                return Err(SecretFetchError::invalid_response(
                    "read",
                    format!("unexpected HTTP status {}", status),
                ));
            }
        }

        let body: KvReadResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error("read", e))?;

        // A deleted or destroyed version comes back without data
        if body.data.data.is_null() {
            return Err(not_found(mount, path));
        }

        let document = SecretDocument::from_value(body.data.data)?;
        debug!(mount, path, keys = document.len(), "secret read from Vault");
        Ok(document)
    }

    async fn session_token(&self) -> SecretFetchResult<String> {
        match &self.strategy {
            CredentialStrategy::Token(token) => Ok(token.clone()),
            CredentialStrategy::UserPass { username, password } => self.login(username, password).await,
        }
    }

    async fn login(&self, username: &str, password: &str) -> SecretFetchResult<String> {
        let url = self.endpoint(&["auth", "userpass", "login", username])?;

        debug!(username, "logging in to Vault with userpass");

        let response = self
            .http
            .post(url)
            .json(&LoginRequest { password })
            .send()
            .await
            .map_err(|e| self.transport_error("login", e))?;

        let status = response.status();
        if matches!(status.as_u16(), 400 | 401 | 403) {
            return Err(SecretFetchError::Unauthorized {
                operation: "login",
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(SecretFetchError::invalid_response(
                "login",
                format!("unexpected HTTP status {}", status.as_u16()),
            ));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error("login", e))?;
        Ok(body.auth.client_token)
    }

    fn endpoint(&self, segments: &[&str]) -> SecretFetchResult<Url> {
        let mut url = self.settings.address.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SecretFetchError::invalid_response("request", "Vault address cannot be used as a base URL")
            })?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, operation: &'static str, err: reqwest::Error) -> SecretFetchError {
        if err.is_timeout() {
            SecretFetchError::Timeout {
                operation,
                after: self.settings.timeout,
            }
        } else if err.is_decode() {
            SecretFetchError::invalid_response(operation, err.to_string())
        } else {
            SecretFetchError::Unreachable {
                address: self.settings.address.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.settings.address.as_str())
            .field("timeout", &self.settings.timeout)
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn not_found(mount: &str, path: &str) -> SecretFetchError {
    SecretFetchError::NotFound {
        mount: mount.to_string(),
        path: path.to_string(),
    }
}
