//! Layered configuration composition
//!
//! Layer order (later layers override earlier ones per key):
//! 1. Built-in defaults, then base files in the order they were added
//! 2. Inline blob from the `appsettings` setting (`env_appsettings.json`)
//! 3. Vault secret (`vault_appsettings.json`), when both `vault_address`
//!    and `vault_secret_path` are set
//!
//! Each layer is produced independently and merged into a new map; nothing
//! is shared or mutated between steps.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{
    load_source, ConfigError, ConfigResult, ConfigSource, Configuration, InMemoryConfigSource,
};
use crate::settings::{keys, BootstrapSettings};
use crate::vault::{
    resolve_credentials, SecretFetchError, SecretFetcher, SecretRequest, VaultClientSettings,
    VaultSecretFetcher, DEFAULT_MOUNT, DEFAULT_TIMEOUT,
};

/// Errors that abort startup
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("failed to fetch configuration secret: {0}")]
    SecretFetch(#[from] SecretFetchError),
}

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Which stage of the pipeline a layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Defaults,
    File,
    Inline,
    Vault,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Defaults => "defaults",
            LayerKind::File => "file",
            LayerKind::Inline => "inline",
            LayerKind::Vault => "vault",
        }
    }
}

/// Record of one layer that took part in composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub kind: LayerKind,
    /// Logical source name (file name, or the synthetic file name)
    pub source: String,
    /// Number of keys the layer supplied
    pub keys: usize,
}

/// Result of composition with source tracking
#[derive(Debug, Clone)]
pub struct ComposedConfiguration {
    pub configuration: Configuration,
    /// Layers in the order they were applied
    pub layers: Vec<LayerInfo>,
}

impl ComposedConfiguration {
    /// Whether a layer of the given kind was applied
    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layers.iter().any(|l| l.kind == kind)
    }
}

struct Layer {
    info: LayerInfo,
    configuration: Configuration,
}

impl Layer {
    fn new(kind: LayerKind, source: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            info: LayerInfo {
                kind,
                source: source.into(),
                keys: configuration.len(),
            },
            configuration,
        }
    }
}

/// Decide whether the Vault layer is active and, if so, what to fetch
///
/// Pure: validates settings and credentials without touching the network.
///
/// - no `vault_secret_path`: `None`
/// - `vault_secret_path` without `vault_address`: `MissingSetting`
/// - otherwise a request using the resolved credentials, with the mount
///   defaulting to `secret`
pub fn plan_secret_request(
    settings: &BootstrapSettings,
    timeout: Duration,
) -> ConfigResult<Option<SecretRequest>> {
    let address = settings.get(keys::VAULT_ADDRESS);
    let Some(path) = settings.get(keys::VAULT_SECRET_PATH) else {
        if address.is_some() {
            debug!("vault_address is set without vault_secret_path; skipping Vault configuration");
        }
        return Ok(None);
    };

    let address = address.ok_or_else(|| ConfigError::MissingSetting {
        key: keys::VAULT_ADDRESS.to_string(),
        reason: format!("required when {} is set", keys::VAULT_SECRET_PATH),
    })?;

    let client = VaultClientSettings::new(address)?.with_timeout(timeout);
    let strategy = resolve_credentials(settings)?;
    let mount = settings.get(keys::VAULT_MOUNT_PATH).unwrap_or(DEFAULT_MOUNT);

    Ok(Some(SecretRequest {
        settings: client,
        strategy,
        mount: mount.to_string(),
        path: path.to_string(),
    }))
}

/// Builds the application configuration at startup
///
/// # Example
///
/// ```rust,ignore
/// let composed = ConfigComposer::new(BootstrapSettings::from_env())
///     .with_source(FileConfigSource::optional("appsettings.json"))
///     .compose()
///     .await?;
/// let greeting = composed.configuration.get("greeting");
/// ```
pub struct ConfigComposer {
    settings: BootstrapSettings,
    defaults: Configuration,
    sources: Vec<Box<dyn ConfigSource>>,
    fetcher: Arc<dyn SecretFetcher>,
    timeout: Duration,
}

impl ConfigComposer {
    /// Create a composer that fetches from Vault over HTTP
    pub fn new(settings: BootstrapSettings) -> Self {
        Self {
            settings,
            defaults: Configuration::new(),
            sources: Vec::new(),
            fetcher: Arc::new(VaultSecretFetcher::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Built-in defaults, the lowest-precedence layer
    pub fn with_defaults(mut self, defaults: Configuration) -> Self {
        self.defaults = defaults;
        self
    }

    /// Append a base source; later sources override earlier ones
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Replace the secret fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SecretFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Bound on the Vault exchange
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// Run the pipeline
    ///
    /// Settings are validated before any file is read or network call made.
    /// Every error is fatal; there is no partially configured result.
    pub async fn compose(&self) -> ComposeResult<ComposedConfiguration> {
        let request = plan_secret_request(&self.settings, self.timeout)?;

        let mut layers = self.base_layers()?;
        if let Some(layer) = self.inline_layer()? {
            layers.push(layer);
        }
        if let Some(request) = request {
            layers.push(self.vault_layer(&request).await?);
        }

        let (configuration, infos) = layers.into_iter().fold(
            (Configuration::new(), Vec::new()),
            |(merged, mut infos), layer| {
                infos.push(layer.info);
                (merged.merge(layer.configuration), infos)
            },
        );

        info!(
            keys = configuration.len(),
            layers = infos.len(),
            "configuration composed"
        );

        Ok(ComposedConfiguration {
            configuration,
            layers: infos,
        })
    }

    fn base_layers(&self) -> ConfigResult<Vec<Layer>> {
        let mut layers = vec![Layer::new(LayerKind::Defaults, "defaults", self.defaults.clone())];
        for source in &self.sources {
            if !source.exists() {
                debug!(source = source.name(), "optional configuration file not found");
                continue;
            }
            layers.push(Layer::new(LayerKind::File, source.name(), load_source(source.as_ref())?));
        }
        Ok(layers)
    }

    fn inline_layer(&self) -> ConfigResult<Option<Layer>> {
        let Some(blob) = self.settings.get(keys::INLINE_CONFIG) else {
            return Ok(None);
        };

        info!("appsettings found in environment, importing config");
        let source = InMemoryConfigSource::inline(blob);
        let configuration = load_source(&source)?;
        Ok(Some(Layer::new(LayerKind::Inline, source.name(), configuration)))
    }

    async fn vault_layer(&self, request: &SecretRequest) -> ComposeResult<Layer> {
        let document = self.fetcher.fetch(request).await?;
        let source = InMemoryConfigSource::vault(&document);
        let configuration = load_source(&source)?;

        info!(
            path = %request.path,
            keys = configuration.len(),
            "Vault secret imported into configuration"
        );
        Ok(Layer::new(LayerKind::Vault, source.name(), configuration))
    }
}

impl std::fmt::Debug for ConfigComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigComposer")
            .field("settings", &self.settings)
            .field("defaults", &self.defaults.len())
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfigSource;
    use crate::vault::{CredentialStrategy, SecretDocument, SecretFetchResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns a fixed document and counts calls
    struct CannedFetcher {
        document: SecretDocument,
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        fn new(value: Value) -> Arc<Self> {
            Arc::new(Self {
                document: SecretDocument::from_value(value).unwrap(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SecretFetcher for CannedFetcher {
        async fn fetch(&self, _request: &SecretRequest) -> SecretFetchResult<SecretDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    /// Always fails
    struct FailingFetcher(fn() -> SecretFetchError);

    #[async_trait]
    impl SecretFetcher for FailingFetcher {
        async fn fetch(&self, _request: &SecretRequest) -> SecretFetchResult<SecretDocument> {
            Err((self.0)())
        }
    }

    fn vault_settings() -> BootstrapSettings {
        BootstrapSettings::new()
            .with(keys::VAULT_ADDRESS, "http://vault.test:8200")
            .with(keys::VAULT_TOKEN, "s.token")
            .with(keys::VAULT_SECRET_PATH, "apps/web")
    }

    fn base() -> Configuration {
        Configuration::from_pairs([("K", "1"), ("only_base", "base")])
    }

    #[tokio::test]
    async fn test_secret_wins_over_inline_wins_over_base() {
        let settings = vault_settings().with(keys::INLINE_CONFIG, r#"{"K": "2", "only_inline": "inline"}"#);
        let fetcher = CannedFetcher::new(json!({"K": "3"}));

        let composed = ConfigComposer::new(settings)
            .with_defaults(base())
            .with_fetcher(fetcher.clone())
            .compose()
            .await
            .unwrap();

        let config = &composed.configuration;
        assert_eq!(config.get("K"), Some("3"));
        assert_eq!(config.get("only_base"), Some("base"));
        assert_eq!(config.get("only_inline"), Some("inline"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let kinds: Vec<_> = composed.layers.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LayerKind::Defaults, LayerKind::Inline, LayerKind::Vault]);
        assert_eq!(composed.layers[1].source, "env_appsettings.json");
        assert_eq!(composed.layers[2].source, "vault_appsettings.json");
    }

    #[tokio::test]
    async fn test_inline_overrides_base() {
        let settings = BootstrapSettings::new().with(keys::INLINE_CONFIG, r#"{"K": "2"}"#);
        let fetcher = CannedFetcher::new(json!({"K": "3"}));

        let composed = ConfigComposer::new(settings)
            .with_defaults(base())
            .with_fetcher(fetcher.clone())
            .compose()
            .await
            .unwrap();

        assert_eq!(composed.configuration.get("K"), Some("2"));
        assert!(!composed.has_layer(LayerKind::Vault));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_base_only_when_nothing_configured() {
        let fetcher = CannedFetcher::new(json!({"K": "3"}));

        let composed = ConfigComposer::new(BootstrapSettings::new())
            .with_defaults(base())
            .with_fetcher(fetcher.clone())
            .compose()
            .await
            .unwrap();

        assert_eq!(composed.configuration, base());
        assert_eq!(composed.layers.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_files_layer_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("appsettings.json");
        let second = dir.path().join("appsettings.Production.yaml");
        std::fs::write(&first, r#"{"K": "file", "Db": {"Host": "localhost", "Port": 5432}}"#).unwrap();
        std::fs::write(&second, "Db:\n  Host: prod-db\n").unwrap();

        let composed = ConfigComposer::new(BootstrapSettings::new())
            .with_defaults(base())
            .with_source(FileConfigSource::required(&first))
            .with_source(FileConfigSource::required(&second))
            .with_source(FileConfigSource::optional(dir.path().join("absent.json")))
            .compose()
            .await
            .unwrap();

        let config = &composed.configuration;
        assert_eq!(config.get("K"), Some("file"));
        assert_eq!(config.get("db:host"), Some("prod-db"));
        assert_eq!(config.get("db:port"), Some("5432"));
        assert_eq!(composed.layers.len(), 3);
        assert_eq!(composed.layers[2].source, "appsettings.Production.yaml");
        assert_eq!(composed.layers[2].keys, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let fetcher = Arc::new(FailingFetcher(|| SecretFetchError::NotFound {
            mount: "secret".to_string(),
            path: "apps/web".to_string(),
        }));

        let err = ConfigComposer::new(vault_settings())
            .with_defaults(base())
            .with_fetcher(fetcher)
            .compose()
            .await
            .unwrap_err();

        assert!(matches!(err, ComposeError::SecretFetch(SecretFetchError::NotFound { .. })));
        assert!(err.to_string().contains("apps/web"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_fetch() {
        let settings = BootstrapSettings::new()
            .with(keys::VAULT_ADDRESS, "http://vault.test:8200")
            .with(keys::VAULT_SECRET_PATH, "apps/web");
        let fetcher = CannedFetcher::new(json!({}));

        let err = ConfigComposer::new(settings)
            .with_fetcher(fetcher.clone())
            .compose()
            .await
            .unwrap_err();

        assert!(matches!(err, ComposeError::Configuration(ConfigError::MissingAuth(_))));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_inline_blob_is_configuration_error() {
        let settings = BootstrapSettings::new().with(keys::INLINE_CONFIG, "not json");

        let err = ConfigComposer::new(settings).compose().await.unwrap_err();

        assert!(matches!(
            err,
            ComposeError::Configuration(ConfigError::Parse { ref source_name, .. })
                if source_name == "env_appsettings.json"
        ));
    }

    #[test]
    fn test_plan_defaults_mount() {
        let request = plan_secret_request(&vault_settings(), DEFAULT_TIMEOUT)
            .unwrap()
            .unwrap();

        assert_eq!(request.mount, "secret");
        assert_eq!(request.path, "apps/web");
        assert_eq!(request.strategy, CredentialStrategy::Token("s.token".to_string()));
        assert_eq!(request.settings.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_plan_uses_configured_mount_and_timeout() {
        let settings = vault_settings().with(keys::VAULT_MOUNT_PATH, "kv-apps");
        let request = plan_secret_request(&settings, Duration::from_secs(3))
            .unwrap()
            .unwrap();

        assert_eq!(request.mount, "kv-apps");
        assert_eq!(request.settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_plan_address_without_path_is_inactive() {
        let settings = BootstrapSettings::new().with(keys::VAULT_ADDRESS, "http://vault.test:8200");
        assert!(plan_secret_request(&settings, DEFAULT_TIMEOUT).unwrap().is_none());
    }

    #[test]
    fn test_plan_path_without_address_fails() {
        let settings = BootstrapSettings::new()
            .with(keys::VAULT_SECRET_PATH, "apps/web")
            .with(keys::VAULT_TOKEN, "s.token");

        let err = plan_secret_request(&settings, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting { ref key, .. } if key == "vault_address"));
    }

    #[test]
    fn test_plan_rejects_bad_address() {
        let settings = vault_settings().with(keys::VAULT_ADDRESS, "vault without scheme");
        let err = plan_secret_request(&settings, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[tokio::test]
    async fn test_compose_reads_vault_over_http_with_userpass() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/svc-orders"))
            .and(body_json(json!({"password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "auth": {"client_token": "s.session"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/kv/apps/data/orders/web"))
            .and(header("X-Vault-Token", "s.session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": {"K": "3", "Db": {"Port": 5432}},
                    "metadata": {"version": 2}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = BootstrapSettings::new()
            .with(keys::VAULT_ADDRESS, server.uri())
            .with(keys::VAULT_USERNAME, "svc-orders")
            .with(keys::VAULT_PASSWORD, "pw")
            .with(keys::VAULT_MOUNT_PATH, "kv/apps")
            .with(keys::VAULT_SECRET_PATH, "orders/web")
            .with(keys::INLINE_CONFIG, r#"{"K": "2", "Db": {"Host": "inline"}}"#);

        let composed = ConfigComposer::new(settings)
            .with_defaults(base())
            .compose()
            .await
            .unwrap();

        let config = &composed.configuration;
        assert_eq!(config.get("k"), Some("3"));
        assert_eq!(config.get("db:port"), Some("5432"));
        assert_eq!(config.get("db:host"), Some("inline"));
        assert_eq!(config.get("only_base"), Some("base"));

        let kinds: Vec<_> = composed.layers.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LayerKind::Defaults, LayerKind::Inline, LayerKind::Vault]);
        assert_eq!(composed.layers[2].source, "vault_appsettings.json");
        assert_eq!(composed.layers[2].keys, 2);
    }
}
