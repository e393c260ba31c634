//! Process-wide log output
//!
//! Library code only uses the `tracing` macros; hosts call [`init`] once at
//! startup to install a subscriber.

mod format;

pub use format::MachineFormat;

use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::system;

/// Environment variable holding filter directives, e.g. `info,vaultboot_core=debug`
pub const LOG_ENV_VAR: &str = "VAULTBOOT_LOG";

/// Debug for our own code, info for the HTTP stack
pub const DEFAULT_DIRECTIVES: &str = "debug,hyper=info,hyper_util=info,reqwest=info,h2=info";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log filter '{directives}': {message}")]
    InvalidFilter { directives: String, message: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub default_directives: String,
    pub env_var: String,
    /// Defaults to the host name
    pub machine_name: Option<String>,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            default_directives: DEFAULT_DIRECTIVES.to_string(),
            env_var: LOG_ENV_VAR.to_string(),
            machine_name: None,
            ansi: false,
        }
    }
}

impl LoggingOptions {
    /// Filter from the environment variable, else the default directives
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        let from_env = std::env::var(&self.env_var)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let directives = from_env.as_deref().unwrap_or(&self.default_directives);

        EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter {
            directives: directives.to_string(),
            message: e.to_string(),
        })
    }
}

/// Install the global subscriber writing to stdout
///
/// Calling this twice returns `AlreadyInitialized` and leaves the first
/// subscriber in place.
pub fn init(options: LoggingOptions) -> Result<(), LoggingError> {
    init_with_writer(options, std::io::stdout)
}

/// Install the global subscriber writing to `writer`
pub fn init_with_writer<W>(options: LoggingOptions, writer: W) -> Result<(), LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = options.filter()?;
    let machine = options
        .machine_name
        .clone()
        .unwrap_or_else(system::machine_name);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(options.ansi)
        .event_format(MachineFormat::new(machine));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
