//! File-based configuration source (JSON or YAML)

use std::fs;
use std::path::{Path, PathBuf};

use super::traits::{ConfigError, ConfigResult, ConfigSource};

/// Configuration file on disk
///
/// An optional file that does not exist contributes nothing; a required one
/// fails with `ConfigError::FileNotFound` when read.
///
/// # Example
///
/// ```no_run
/// use vaultboot_core::config::{load_source, FileConfigSource};
///
/// let base = FileConfigSource::required("appsettings.json");
/// let overrides = FileConfigSource::optional("appsettings.Production.yaml");
///
/// let config = load_source(&base)?.merge(load_source(&overrides)?);
/// # Ok::<(), vaultboot_core::config::ConfigError>(())
/// ```
pub struct FileConfigSource {
    path: PathBuf,
    name: String,
    optional: bool,
}

impl FileConfigSource {
    /// Create a file source
    pub fn new(path: impl Into<PathBuf>, optional: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name, optional }
    }

    /// A file that must exist
    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self::new(path, false)
    }

    /// A file that may be absent
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self::new(path, true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl ConfigSource for FileConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    // A required file reports as existing so that reading it surfaces the error
    fn exists(&self) -> bool {
        !self.optional || self.path.is_file()
    }

    fn contents(&self) -> ConfigResult<String> {
        if !self.path.is_file() {
            return Err(ConfigError::FileNotFound(self.path.clone()));
        }
        Ok(fs::read_to_string(&self.path)?)
    }
}

impl std::fmt::Debug for FileConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigSource")
            .field("path", &self.path)
            .field("optional", &self.optional)
            .field("exists", &self.path.is_file())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_source;
    use tempfile::tempdir;

    #[test]
    fn test_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appsettings.json");
        fs::write(&path, r#"{"Health": {"Description": "from disk"}}"#).unwrap();

        let source = FileConfigSource::required(&path);
        assert_eq!(source.name(), "appsettings.json");
        assert!(source.exists());

        let config = load_source(&source).unwrap();
        assert_eq!(config.get("health:description"), Some("from disk"));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appsettings.yaml");
        fs::write(&path, "health:\n  description: yaml\n").unwrap();

        let config = load_source(&FileConfigSource::required(&path)).unwrap();
        assert_eq!(config.get("health:description"), Some("yaml"));
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        let dir = tempdir().unwrap();
        let source = FileConfigSource::optional(dir.path().join("absent.json"));

        assert!(!source.exists());
        assert!(load_source(&source).unwrap().is_empty());
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempdir().unwrap();
        let source = FileConfigSource::required(dir.path().join("absent.json"));

        assert!(matches!(load_source(&source), Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();

        let err = load_source(&FileConfigSource::required(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
