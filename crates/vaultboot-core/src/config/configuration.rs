//! Flattened key/value configuration
//!
//! Nested documents are flattened into `:`-separated keys, so that
//! `{"Logging": {"Level": "Debug"}}` becomes `logging:level = Debug`.
//! Merging is per flattened key, which lets an overlay replace a single
//! nested value without restating its siblings.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use super::traits::{ConfigError, ConfigResult, ConfigSource, SourceFormat};

/// Separator between path segments of a flattened key
pub const KEY_DELIMITER: &str = ":";

/// Immutable, case-insensitive configuration map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    values: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-flattened pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Flatten a JSON document; the top level must be an object
    pub fn from_json_str(source_name: &str, text: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            source_name: source_name.to_string(),
            format: SourceFormat::Json.as_str(),
            message: e.to_string(),
        })?;
        Self::from_value(source_name, &value)
    }

    /// Flatten a YAML document; the top level must be a mapping
    pub fn from_yaml_str(source_name: &str, text: &str) -> ConfigResult<Self> {
        // Empty YAML files are valid and carry no keys
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            source_name: source_name.to_string(),
            format: SourceFormat::Yaml.as_str(),
            message: e.to_string(),
        })?;
        Self::from_value(source_name, &value)
    }

    /// Flatten a JSON value; the top level must be an object
    pub fn from_value(source_name: &str, value: &Value) -> ConfigResult<Self> {
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject(source_name.to_string()));
        };

        let mut values = BTreeMap::new();
        for (key, child) in map {
            flatten_into(&mut values, key.to_lowercase(), child);
        }
        Ok(Self { values })
    }

    /// Return a new configuration with `overlay` applied on top of `self`
    pub fn merge(mut self, overlay: Configuration) -> Configuration {
        self.values.extend(overlay.values);
        self
    }

    /// Look up a value by flattened key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Look up and parse a value
    ///
    /// Returns `None` when the key is absent, `Some(Err)` when it does not parse.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<Result<T, T::Err>> {
        self.get(key).map(str::parse)
    }

    /// Sub-configuration under `prefix`, with the prefix stripped from keys
    pub fn section(&self, prefix: &str) -> Configuration {
        let prefix = format!("{}{}", prefix.to_lowercase(), KEY_DELIMITER);
        Configuration {
            values: self
                .values
                .iter()
                .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|rest| (rest.to_string(), v.clone())))
                .collect(),
        }
    }

    /// Whether `key` has a value or any child keys
    pub fn section_exists(&self, key: &str) -> bool {
        self.get(key).is_some() || !self.section(key).is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, key: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (child_key, child) in map {
                let child_key = format!("{}{}{}", key, KEY_DELIMITER, child_key.to_lowercase());
                flatten_into(out, child_key, child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(out, format!("{}{}{}", key, KEY_DELIMITER, index), child);
            }
        }
        Value::String(s) => {
            out.insert(key, s.clone());
        }
        Value::Null => {
            out.insert(key, String::new());
        }
        // Numbers and booleans keep their JSON spelling
        other => {
            out.insert(key, other.to_string());
        }
    }
}

/// Read and flatten a configuration source
///
/// A source that does not exist contributes an empty configuration.
pub fn load_source(source: &dyn ConfigSource) -> ConfigResult<Configuration> {
    if !source.exists() {
        return Ok(Configuration::new());
    }
    let text = source.contents()?;
    match source.format() {
        SourceFormat::Json => Configuration::from_json_str(source.name(), &text),
        SourceFormat::Yaml => Configuration::from_yaml_str(source.name(), &text),
    }
}
