//! Health checks and the registry that runs them

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::model::{HealthEntry, HealthReport};

/// Errors raised while building a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a health check named '{0}' is already registered")]
    DuplicateName(String),
}

/// A named probe contributing one entry to a report
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    /// Tags used to select a subset of checks
    fn tags(&self) -> &[String] {
        &[]
    }

    fn check(&self) -> HealthEntry;
}

/// Health check backed by a closure
pub struct FnHealthCheck<F> {
    name: String,
    tags: Vec<String>,
    probe: F,
}

impl<F> FnHealthCheck<F>
where
    F: Fn() -> HealthEntry + Send + Sync,
{
    pub fn new(name: impl Into<String>, probe: F) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            probe,
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl<F> HealthCheck for FnHealthCheck<F>
where
    F: Fn() -> HealthEntry + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn check(&self) -> HealthEntry {
        (self.probe)()
    }
}

/// Ordered set of uniquely named checks
#[derive(Default, Clone)]
pub struct HealthRegistry {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: impl HealthCheck + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(check))
    }

    pub fn register_shared(&mut self, check: Arc<dyn HealthCheck>) -> Result<(), RegistryError> {
        if self.contains(check.name()) {
            return Err(RegistryError::DuplicateName(check.name().to_string()));
        }
        debug!("Registered health check '{}'", check.name());
        self.checks.push(check);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.iter().any(|c| c.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check
    pub fn report(&self) -> HealthReport {
        self.run(|_| true)
    }

    /// Run only the checks carrying `tag`
    pub fn report_tagged(&self, tag: &str) -> HealthReport {
        self.run(|check| check.tags().iter().any(|t| t == tag))
    }

    fn run(&self, include: impl Fn(&dyn HealthCheck) -> bool) -> HealthReport {
        self.checks
            .iter()
            .filter(|check| include(check.as_ref()))
            .map(|check| {
                let entry = run_check(check.as_ref()).with_tags(check.tags().iter().cloned());
                (check.name().to_string(), entry)
            })
            .collect()
    }
}

fn run_check(check: &dyn HealthCheck) -> HealthEntry {
    match catch_unwind(AssertUnwindSafe(|| check.check())) {
        Ok(entry) => entry,
        Err(_) => {
            warn!("Health check '{}' panicked", check.name());
            HealthEntry::unhealthy(format!("health check '{}' panicked", check.name()))
        }
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("checks", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
