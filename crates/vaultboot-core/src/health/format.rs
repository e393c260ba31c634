//! Health report rendering
//!
//! Two renderings are supported: an indented plain-text block per entry and
//! a JSON document of the form
//!
//! ```json
//! {
//!   "status": "Degraded",
//!   "results": {
//!     "db": { "status": "Degraded", "description": "slow", "data": { "latency_ms": "500" } }
//!   }
//! }
//! ```

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::model::{DataValue, HealthReport};

/// Line printed before and after each text entry
pub const SEPARATOR: &str = "---------------------------------------------------------------------------------------------------------------------";

const TEXT_CONTENT_TYPE: &str = "text/plain";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors produced while rendering a report
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("health check '{check}' data '{key}' is not a finite number")]
    NonFiniteNumber { check: String, key: String },

    #[error("failed to serialize health report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Output format of a rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthFormat {
    Text,
    Json,
}

impl HealthFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            HealthFormat::Text => TEXT_CONTENT_TYPE,
            HealthFormat::Json => JSON_CONTENT_TYPE,
        }
    }
}

/// Response body plus its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub content_type: &'static str,
    pub body: String,
}

/// Render `report` in the requested format
pub fn render(format: HealthFormat, report: &HealthReport) -> Result<RenderedReport, RenderError> {
    let body = match format {
        HealthFormat::Text => render_text(report),
        HealthFormat::Json => render_json(report)?,
    };
    Ok(RenderedReport {
        content_type: format.content_type(),
        body,
    })
}

/// One block per entry, in name order
pub fn render_text(report: &HealthReport) -> String {
    let mut out = String::new();
    for entry in report.entries().values() {
        let data = entry
            .data
            .iter()
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect::<Vec<_>>()
            .join("\n\t\t");

        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str(&format!("        Status: {}\n", entry.status));
        out.push_str(&format!("   Description: {}\n", entry.description));
        out.push_str(&format!("          Data: {}\n", data));
        out.push_str(SEPARATOR);
        out.push('\n');
    }
    out
}

/// Pretty-printed JSON document with overall status and per-entry results
pub fn render_json(report: &HealthReport) -> Result<String, RenderError> {
    let mut results = Map::new();
    for (name, entry) in report.entries() {
        let mut data = Map::new();
        for (key, value) in &entry.data {
            data.insert(key.clone(), data_to_json(name, key, value)?);
        }

        let mut result = Map::new();
        result.insert("status".into(), Value::String(entry.status.to_string()));
        result.insert("description".into(), Value::String(entry.description.clone()));
        result.insert("data".into(), Value::Object(data));
        results.insert(name.clone(), Value::Object(result));
    }

    let mut document = Map::new();
    document.insert("status".into(), Value::String(report.status().to_string()));
    document.insert("results".into(), Value::Object(results));

    Ok(serde_json::to_string_pretty(&Value::Object(document))?)
}

fn data_to_json(check: &str, key: &str, value: &DataValue) -> Result<Value, RenderError> {
    Ok(match value {
        DataValue::String(s) => Value::String(s.clone()),
        DataValue::Integer(n) => Value::Number((*n).into()),
        DataValue::Float(n) => {
            Value::Number(
                Number::from_f64(*n).ok_or_else(|| RenderError::NonFiniteNumber {
                    check: check.to_string(),
                    key: key.to_string(),
                })?,
            )
        }
        DataValue::Bool(b) => Value::Bool(*b),
        DataValue::Null => Value::Null,
    })
}

/// Pick a format from an `Accept` header value
///
/// The highest-weighted of `application/json` (or any `+json` type) and
/// `text/plain` wins; ties go to the first listed. Anything else, including a
/// missing header or `*/*`, yields text.
pub fn negotiate(accept: Option<&str>) -> HealthFormat {
    let Some(accept) = accept else {
        return HealthFormat::Text;
    };

    let mut best: Option<(HealthFormat, f32)> = None;
    for range in accept.split(',') {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let format = if media == JSON_CONTENT_TYPE || media.ends_with("+json") {
            HealthFormat::Json
        } else if media == TEXT_CONTENT_TYPE {
            HealthFormat::Text
        } else {
            continue;
        };

        let weight = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        if weight <= 0.0 {
            continue;
        }

        match best {
            Some((_, current)) if current >= weight => {}
            _ => best = Some((format, weight)),
        }
    }

    best.map(|(format, _)| format).unwrap_or(HealthFormat::Text)
}
