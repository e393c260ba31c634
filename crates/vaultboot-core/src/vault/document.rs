//! Secret payloads returned by the KV v2 engine

use serde_json::{Map, Value};

use super::error::{SecretFetchError, SecretFetchResult};

/// The key/value payload of a single secret version
///
/// The composer treats it as an opaque JSON object and splices its text into
/// the configuration pipeline.
#[derive(Clone, PartialEq, Default)]
pub struct SecretDocument {
    data: Map<String, Value>,
}

impl SecretDocument {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> SecretFetchResult<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(SecretFetchError::invalid_response(
                "read",
                format!("secret data must be an object, got {}", json_type(&other)),
            )),
        }
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serialized JSON text of the payload
    pub fn to_json(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

// Never print secret values
impl std::fmt::Debug for SecretDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretDocument")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
