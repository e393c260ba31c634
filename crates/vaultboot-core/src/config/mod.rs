//! Configuration sources and the flattened configuration map
//!
//! Supports:
//! - `FileConfigSource`: JSON/YAML files on disk
//! - `InMemoryConfigSource`: synthetic files for inline blobs and Vault secrets

mod traits;
mod configuration;
mod memory;
mod file;

pub use traits::{ConfigSource, ConfigError, ConfigResult, ChangeToken, SourceFormat};
pub use configuration::{Configuration, load_source, KEY_DELIMITER};
pub use memory::{InMemoryConfigSource, INLINE_SOURCE_NAME, VAULT_SOURCE_NAME};
pub use file::FileConfigSource;
