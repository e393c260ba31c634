//! Vaultboot Core
//!
//! Startup plumbing for services that keep their configuration in HashiCorp
//! Vault. Bootstrap settings come from the environment; configuration is
//! composed from defaults, base files, an inline JSON blob and a Vault KV v2
//! secret, in that order of precedence; health checks render as text or JSON.
//!
//! ```rust,ignore
//! use vaultboot_core::{logging, BootstrapSettings, Foundation};
//!
//! logging::init(logging::LoggingOptions::default())?;
//!
//! let started = Foundation::new(BootstrapSettings::from_env())
//!     .base_file("appsettings.json", true)
//!     .start()
//!     .await?;
//!
//! let db = started.configuration.get("db:connectionstring");
//! ```

pub mod compose;
pub mod config;
pub mod health;
pub mod host;
pub mod logging;
pub mod settings;
pub mod system;
pub mod vault;

// Re-export commonly used types
pub use settings::BootstrapSettings;

pub use config::{
    ConfigError, ConfigResult, ConfigSource, Configuration, FileConfigSource,
    InMemoryConfigSource,
};

pub use vault::{
    fetch_secret, resolve_credentials, CredentialStrategy, SecretDocument, SecretFetchError,
    SecretFetcher, VaultClient, VaultClientSettings, VaultSecretFetcher,
};

pub use compose::{ComposeError, ComposedConfiguration, ConfigComposer};

pub use health::{
    HealthCheck, HealthEntry, HealthFormat, HealthRegistry, HealthReport, HealthStatus,
    RenderError,
};

pub use host::{Foundation, Started, StartupError};
