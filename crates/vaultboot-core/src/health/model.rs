//! Health report data model

use std::collections::BTreeMap;
use std::fmt;

/// Result of a single health check
///
/// Variants are ordered worst first, so the overall status of a report is
/// the minimum of its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    Unhealthy,
    Degraded,
    Healthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar diagnostic value attached to a health entry
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => f.write_str(s),
            DataValue::Integer(n) => write!(f, "{}", n),
            DataValue::Float(n) => write!(f, "{}", n),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Null => Ok(()),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Integer(value.into())
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        DataValue::Integer(value.into())
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

/// Outcome of one named check
#[derive(Debug, Clone, PartialEq)]
pub struct HealthEntry {
    pub status: HealthStatus,
    pub description: String,
    pub data: BTreeMap<String, DataValue>,
    pub tags: Vec<String>,
}

impl HealthEntry {
    pub fn new(status: HealthStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            data: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn healthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Healthy, description)
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, description)
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy, description)
    }

    /// Attach a diagnostic value
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Snapshot of all check results for one request
///
/// Entries are keyed and iterated by check name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthReport {
    entries: BTreeMap<String, HealthEntry>,
}

impl HealthReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `name`
    pub fn insert(&mut self, name: impl Into<String>, entry: HealthEntry) -> Option<HealthEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: HealthEntry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Worst status among entries; `Healthy` when there are none
    pub fn status(&self) -> HealthStatus {
        self.entries
            .values()
            .map(|e| e.status)
            .min()
            .unwrap_or(HealthStatus::Healthy)
    }

    pub fn entries(&self) -> &BTreeMap<String, HealthEntry> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&HealthEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, HealthEntry)> for HealthReport {
    fn from_iter<I: IntoIterator<Item = (String, HealthEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
