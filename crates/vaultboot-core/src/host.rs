//! Startup foundation
//!
//! Wires bootstrap settings, configuration composition and health checks
//! into the immutable state a service runs with.
//!
//! ```rust,ignore
//! let started = Foundation::new(BootstrapSettings::from_env())
//!     .base_file("appsettings.json", true)
//!     .start()
//!     .await?;
//!
//! let response = started.health_response(Some("application/json"))?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::compose::{ComposeError, ConfigComposer, LayerInfo};
use crate::config::{ConfigSource, Configuration, FileConfigSource};
use crate::health::{
    negotiate, render, ApplicationCheck, HealthCheck, HealthRegistry, RegistryError, RenderError,
    RenderedReport,
};
use crate::settings::BootstrapSettings;
use crate::vault::SecretFetcher;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("health check registration failed: {0}")]
    Health(#[from] RegistryError),
}

/// Builder for a [`Started`] service
pub struct Foundation {
    composer: ConfigComposer,
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl Foundation {
    pub fn new(settings: BootstrapSettings) -> Self {
        Self {
            composer: ConfigComposer::new(settings),
            checks: Vec::new(),
        }
    }

    pub fn defaults(mut self, defaults: Configuration) -> Self {
        self.composer = self.composer.with_defaults(defaults);
        self
    }

    /// Add a JSON or YAML file layer
    pub fn base_file(self, path: impl Into<PathBuf>, optional: bool) -> Self {
        let source = if optional {
            FileConfigSource::optional(path)
        } else {
            FileConfigSource::required(path)
        };
        self.source(source)
    }

    pub fn source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.composer = self.composer.with_source(source);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn SecretFetcher>) -> Self {
        self.composer = self.composer.with_fetcher(fetcher);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.composer = self.composer.with_timeout(timeout);
        self
    }

    /// Register an additional health check alongside the application check
    pub fn check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Compose configuration, then build the health registry from it
    pub async fn start(self) -> Result<Started, StartupError> {
        let composed = self.composer.compose().await?;

        let mut health = HealthRegistry::new();
        health.register(ApplicationCheck::from_configuration(&composed.configuration))?;
        for check in self.checks {
            health.register_shared(check)?;
        }

        info!(
            checks = health.len(),
            layers = composed.layers.len(),
            "startup complete"
        );

        Ok(Started {
            configuration: Arc::new(composed.configuration),
            layers: composed.layers,
            health: Arc::new(health),
        })
    }
}

impl std::fmt::Debug for Foundation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Foundation")
            .field("composer", &self.composer)
            .field("checks", &self.checks.iter().map(|c| c.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Resolved state of a running service; read-only and cheap to clone
#[derive(Debug, Clone)]
pub struct Started {
    pub configuration: Arc<Configuration>,
    pub layers: Vec<LayerInfo>,
    pub health: Arc<HealthRegistry>,
}

impl Started {
    /// Run every check and render for the given `Accept` header
    pub fn health_response(&self, accept: Option<&str>) -> Result<RenderedReport, RenderError> {
        render(negotiate(accept), &self.health.report())
    }
}
