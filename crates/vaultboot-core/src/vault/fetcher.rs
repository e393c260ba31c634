//! Secret fetching as an explicit, bounded startup step

use async_trait::async_trait;
use tracing::{info, warn};

use super::client::{VaultClient, VaultClientSettings};
use super::credentials::CredentialStrategy;
use super::document::SecretDocument;
use super::error::{SecretFetchError, SecretFetchResult};

/// Everything needed to fetch one secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub settings: VaultClientSettings,
    pub strategy: CredentialStrategy,
    pub mount: String,
    pub path: String,
}

/// Source of secret documents
///
/// Implementations:
/// - `VaultSecretFetcher`: reads from a Vault server over HTTP
/// - test doubles that return canned documents or errors
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Fetch the secret described by `request`
    async fn fetch(&self, request: &SecretRequest) -> SecretFetchResult<SecretDocument>;
}

/// Fetches secrets from Vault
///
/// The whole exchange (login plus read) is bounded by the request timeout.
/// Failures are returned as-is; there are no retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultSecretFetcher;

impl VaultSecretFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretFetcher for VaultSecretFetcher {
    async fn fetch(&self, request: &SecretRequest) -> SecretFetchResult<SecretDocument> {
        let timeout = request.settings.timeout;
        let client = VaultClient::new(request.settings.clone(), request.strategy.clone())?;

        info!(
            address = %request.settings.address,
            mount = %request.mount,
            path = %request.path,
            auth = request.strategy.method(),
            "fetching configuration secret from Vault"
        );

        let result = match tokio::time::timeout(timeout, client.read_secret(&request.mount, &request.path)).await {
            Ok(result) => result,
            Err(_) => Err(SecretFetchError::Timeout {
                operation: "fetch",
                after: timeout,
            }),
        };

        if let Err(e) = &result {
            warn!(kind = e.kind(), "Vault secret fetch failed: {}", e);
        }
        result
    }
}

/// Fetch one secret with the given credentials
///
/// Convenience wrapper over `VaultSecretFetcher`.
pub async fn fetch_secret(
    strategy: CredentialStrategy,
    settings: VaultClientSettings,
    mount: &str,
    path: &str,
) -> SecretFetchResult<SecretDocument> {
    let request = SecretRequest {
        settings,
        strategy,
        mount: mount.to_string(),
        path: path.to_string(),
    };
    VaultSecretFetcher::new().fetch(&request).await
}
