//! In-memory (synthetic) configuration source
//!
//! Stands in for a configuration file whose contents never touched disk:
//! an inline blob passed through the environment, or a secret fetched from
//! Vault at startup.

use super::traits::{ChangeToken, ConfigResult, ConfigSource};
use crate::vault::SecretDocument;

/// Logical file name for a blob supplied through the `appsettings` setting
pub const INLINE_SOURCE_NAME: &str = "env_appsettings.json";

/// Logical file name for a secret fetched from Vault
pub const VAULT_SOURCE_NAME: &str = "vault_appsettings.json";

/// A read-only configuration file held in memory
///
/// The source always exists and never signals changes: its contents are
/// captured once at construction.
#[derive(Clone)]
pub struct InMemoryConfigSource {
    name: String,
    data: String,
}

impl InMemoryConfigSource {
    /// Create a source with an arbitrary logical name
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Wrap an inline JSON blob
    pub fn inline(blob: impl Into<String>) -> Self {
        Self::new(INLINE_SOURCE_NAME, blob)
    }

    /// Wrap a fetched Vault secret
    pub fn vault(document: &SecretDocument) -> Self {
        Self::new(VAULT_SOURCE_NAME, document.to_json())
    }

    /// Size of the contents in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ConfigSource for InMemoryConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self) -> bool {
        true
    }

    fn contents(&self) -> ConfigResult<String> {
        Ok(self.data.clone())
    }

    fn watch(&self) -> ChangeToken {
        ChangeToken::none()
    }
}

// Contents may be secret material
impl std::fmt::Debug for InMemoryConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConfigSource")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_source, SourceFormat};
    use serde_json::json;

    #[test]
    fn test_inline_source() {
        let source = InMemoryConfigSource::inline(r#"{"K": "2"}"#);

        assert_eq!(source.name(), "env_appsettings.json");
        assert!(source.exists());
        assert_eq!(source.format(), SourceFormat::Json);
        assert_eq!(source.contents().unwrap(), r#"{"K": "2"}"#);
        assert!(!source.watch().has_changed());
    }

    #[test]
    fn test_vault_source_holds_document_json() {
        let document = SecretDocument::from_value(json!({"ConnectionStrings": {"Db": "Server=db"}})).unwrap();
        let source = InMemoryConfigSource::vault(&document);

        assert_eq!(source.name(), "vault_appsettings.json");
        let config = load_source(&source).unwrap();
        assert_eq!(config.get("connectionstrings:db"), Some("Server=db"));
    }

    #[test]
    fn test_debug_hides_contents() {
        let source = InMemoryConfigSource::inline(r#"{"password": "hunter2"}"#);
        let debug = format!("{:?}", source);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("env_appsettings.json"));
    }
}
