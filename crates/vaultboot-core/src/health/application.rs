//! Built-in liveness check describing the running process

use chrono::{Local, SecondsFormat, Utc};

use super::checks::HealthCheck;
use super::model::{DataValue, HealthEntry};
use crate::config::Configuration;
use crate::system;

pub const APPLICATION_CHECK_NAME: &str = "Health Check";
pub const APPLICATION_CHECK_TAG: &str = "all";
pub const DESCRIPTION_KEY: &str = "health:description";
pub const DEFAULT_DESCRIPTION: &str = "Application is running";

/// Always healthy while the process can answer; reports host facts as data
#[derive(Debug, Clone)]
pub struct ApplicationCheck {
    description: String,
    tags: Vec<String>,
}

impl ApplicationCheck {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            tags: vec![APPLICATION_CHECK_TAG.to_string()],
        }
    }

    /// Description from `health:description`, falling back to the default
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self::new(
            configuration
                .get(DESCRIPTION_KEY)
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(DEFAULT_DESCRIPTION),
        )
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for ApplicationCheck {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTION)
    }
}

impl HealthCheck for ApplicationCheck {
    fn name(&self) -> &str {
        APPLICATION_CHECK_NAME
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn check(&self) -> HealthEntry {
        let working_set = system::working_set_bytes()
            .map(|bytes| DataValue::String(bytes.to_string()))
            .unwrap_or(DataValue::Null);

        HealthEntry::healthy(self.description.clone())
            .with_data("Environment.MachineName", system::machine_name())
            .with_data("Environment.OSVersion", system::os_version())
            .with_data(
                "Environment.ProcessorCount",
                system::processor_count().to_string(),
            )
            .with_data("Environment.WorkingSet", working_set)
            .with_data(
                "DateTime.UtcNow",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .with_data(
                "DateTimeOffset.Now",
                Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::model::HealthStatus;

    #[test]
    fn test_default_description() {
        let check = ApplicationCheck::from_configuration(&Configuration::new());
        assert_eq!(check.description(), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_description_from_configuration() {
        let config = Configuration::from_pairs([("health:description", "Orders API is up")]);
        let check = ApplicationCheck::from_configuration(&config);
        assert_eq!(check.description(), "Orders API is up");

        let entry = check.check();
        assert_eq!(entry.description, "Orders API is up");
    }

    #[test]
    fn test_check_reports_host_facts() {
        let check = ApplicationCheck::default();
        assert_eq!(check.name(), "Health Check");
        assert_eq!(check.tags(), &["all".to_string()]);

        let entry = check.check();
        assert_eq!(entry.status, HealthStatus::Healthy);
        for key in [
            "Environment.MachineName",
            "Environment.OSVersion",
            "Environment.ProcessorCount",
            "Environment.WorkingSet",
            "DateTime.UtcNow",
            "DateTimeOffset.Now",
        ] {
            assert!(entry.data.contains_key(key), "missing {}", key);
        }

        let utc = entry.data["DateTime.UtcNow"].to_string();
        assert!(chrono::DateTime::parse_from_rfc3339(&utc).is_ok());
        assert!(utc.ends_with('Z'));
        let local = entry.data["DateTimeOffset.Now"].to_string();
        assert!(chrono::DateTime::parse_from_rfc3339(&local).is_ok());
    }
}
