//! Bootstrap settings read before any remote configuration is resolved
//!
//! These are the raw values the host hands to the composer: the Vault
//! address, credentials, secret location and an optional inline
//! configuration blob.

mod bootstrap;

pub use bootstrap::BootstrapSettings;

/// Well-known bootstrap setting keys
pub mod keys {
    /// Base URL of the Vault server
    pub const VAULT_ADDRESS: &str = "vault_address";
    /// Token for token authentication
    pub const VAULT_TOKEN: &str = "vault_token";
    /// Username for userpass authentication
    pub const VAULT_USERNAME: &str = "vault_username";
    /// Password for userpass authentication
    pub const VAULT_PASSWORD: &str = "vault_password";
    /// Path of the secret within the mount
    pub const VAULT_SECRET_PATH: &str = "vault_secret_path";
    /// KV v2 mount the secret lives under
    pub const VAULT_MOUNT_PATH: &str = "vault_mount_path";
    /// Inline JSON configuration blob
    pub const INLINE_CONFIG: &str = "appsettings";

    /// Keys whose values must never appear in logs or debug output
    pub const SENSITIVE: &[&str] = &[VAULT_TOKEN, VAULT_PASSWORD];
}
