//! HashiCorp Vault integration
//!
//! Resolves credentials from bootstrap settings and reads a single KV v2
//! secret whose contents become a configuration layer.
//!
//! ```rust,ignore
//! let strategy = resolve_credentials(&settings)?;
//! let client = VaultClientSettings::new("https://vault.internal:8200")?;
//! let document = fetch_secret(strategy, client, "secret", "apps/web").await?;
//! ```

mod client;
mod credentials;
mod document;
mod error;
mod fetcher;

pub use client::{VaultClient, VaultClientSettings, DEFAULT_MOUNT, DEFAULT_TIMEOUT};
pub use credentials::{resolve_credentials, CredentialStrategy};
pub use document::SecretDocument;
pub use error::{SecretFetchError, SecretFetchResult};
pub use fetcher::{fetch_secret, SecretFetcher, SecretRequest, VaultSecretFetcher};
