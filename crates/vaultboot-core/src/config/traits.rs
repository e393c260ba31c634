//! Configuration source trait and errors

use std::path::PathBuf;

/// A named, read-only supplier of configuration file contents
///
/// Implementations:
/// - `FileConfigSource`: a JSON or YAML file on disk
/// - `InMemoryConfigSource`: a synthetic file holding an inline blob or a
///   fetched Vault secret
///
/// The name is a logical file name; its extension selects the parser.
pub trait ConfigSource: Send + Sync {
    /// Logical file name (e.g. `appsettings.json`)
    fn name(&self) -> &str;

    /// Whether the underlying file exists
    fn exists(&self) -> bool;

    /// Full text of the file
    fn contents(&self) -> ConfigResult<String>;

    /// Change notifications for this source
    fn watch(&self) -> ChangeToken {
        ChangeToken::none()
    }

    /// Format used to parse `contents`
    fn format(&self) -> SourceFormat {
        SourceFormat::from_name(self.name())
    }
}

/// File format of a configuration source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Pick a format from a file name; anything not `.yaml`/`.yml` is JSON
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            SourceFormat::Yaml
        } else {
            SourceFormat::Json
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Yaml => "yaml",
        }
    }
}

/// Change notification handle returned by `ConfigSource::watch`
///
/// Sources in this crate are read once at startup, so the only token is the
/// inert one: it never reports a change and never invokes callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeToken {
    _private: (),
}

impl ChangeToken {
    /// A token that never fires
    pub fn none() -> Self {
        Self { _private: () }
    }

    pub fn has_changed(&self) -> bool {
        false
    }

    pub fn active_callbacks(&self) -> bool {
        false
    }
}

/// Errors that can occur while reading bootstrap settings or configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing or incomplete auth settings: {0}")]
    MissingAuth(String),

    #[error("ambiguous credentials: vault_token and vault_username/vault_password are both set; supply only one")]
    AmbiguousCredentials,

    #[error("missing setting '{key}': {reason}")]
    MissingSetting { key: String, reason: String },

    #[error("invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },

    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to parse {format} in '{source_name}': {message}")]
    Parse {
        source_name: String,
        format: &'static str,
        message: String,
    },

    #[error("'{0}' must contain an object at the top level")]
    NotAnObject(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
