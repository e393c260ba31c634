//! Health reporting
//!
//! Checks are registered once at startup; every request builds a fresh
//! `HealthReport` and renders it as text or JSON.

mod application;
mod checks;
mod format;
mod model;

pub use application::{
    ApplicationCheck, APPLICATION_CHECK_NAME, APPLICATION_CHECK_TAG, DEFAULT_DESCRIPTION,
    DESCRIPTION_KEY,
};
pub use checks::{FnHealthCheck, HealthCheck, HealthRegistry, RegistryError};
pub use format::{
    negotiate, render, render_json, render_text, HealthFormat, RenderError, RenderedReport,
    SEPARATOR,
};
pub use model::{DataValue, HealthEntry, HealthReport, HealthStatus};
