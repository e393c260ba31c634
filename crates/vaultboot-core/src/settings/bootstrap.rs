//! Flat, case-insensitive bootstrap settings map

use std::collections::{BTreeMap, HashMap};
use std::env;

use once_cell::sync::Lazy;

use super::keys;

/// Mapping from setting keys to the environment variables that can supply them
///
/// The first non-empty variable wins.
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(keys::VAULT_ADDRESS, vec!["VAULT_ADDRESS", "VAULT_ADDR"]);
    m.insert(keys::VAULT_TOKEN, vec!["VAULT_TOKEN"]);
    m.insert(keys::VAULT_USERNAME, vec!["VAULT_USERNAME"]);
    m.insert(keys::VAULT_PASSWORD, vec!["VAULT_PASSWORD"]);
    m.insert(keys::VAULT_SECRET_PATH, vec!["VAULT_SECRET_PATH"]);
    m.insert(keys::VAULT_MOUNT_PATH, vec!["VAULT_MOUNT_PATH", "VAULT_PROVIDER_PATH"]);
    m.insert(keys::INLINE_CONFIG, vec!["APPSETTINGS", "appsettings"]);
    m
});

/// Raw settings available at process start
///
/// Keys are case-insensitive and stored lowercase. Empty values are treated
/// as absent everywhere, so `get` never returns `Some("")`.
///
/// # Example
///
/// ```
/// use vaultboot_core::settings::{keys, BootstrapSettings};
///
/// let settings = BootstrapSettings::new()
///     .with("VAULT_ADDRESS", "http://127.0.0.1:8200")
///     .with(keys::VAULT_TOKEN, "s.token");
///
/// assert_eq!(settings.get(keys::VAULT_ADDRESS), Some("http://127.0.0.1:8200"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BootstrapSettings {
    values: BTreeMap<String, String>,
}

impl BootstrapSettings {
    /// Create an empty settings map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from key/value pairs; later duplicates win
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |settings, (k, v)| settings.with(k, v))
    }

    /// Read the well-known settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the well-known settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::new();
        for (key, env_vars) in ENV_VAR_MAP.iter() {
            let value = env_vars
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.is_empty());
            if let Some(value) = value {
                settings.values.insert((*key).to_string(), value);
            }
        }
        settings
    }

    /// Return a copy with `key` set to `value`
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        let value = value.into();
        let key = key.as_ref().to_lowercase();
        if value.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
        self
    }

    /// Look up a setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Check whether a setting is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate settings in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if keys::SENSITIVE.contains(&key.as_str()) {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}
