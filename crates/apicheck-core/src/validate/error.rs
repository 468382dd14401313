//! Validation failure types

use std::fmt;

use serde_json::Value;

/// Data did not satisfy a schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The schema node that rejected the value
    pub schema: Value,
    /// The offending value
    pub value: Value,
    /// Human-readable reason
    pub message: String,
    /// Key path to the offending value, e.g. `items[2].name`
    pub key: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Data and schema do not match.")?;
        if let Some(key) = &self.key {
            write!(f, " [{key}]")?;
        }
        write!(f, " {}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of a failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// The schema itself is unusable, regardless of data.
    #[error("Invalid schema definition: {message}")]
    InvalidDefinition { message: String, schema: Value },
    #[error(transparent)]
    Mismatch(#[from] ValidationError),
}

impl SchemaError {
    pub(super) fn invalid(message: impl Into<String>, schema: &Value) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
            schema: schema.clone(),
        }
    }

    pub(super) fn mismatch(
        message: impl Into<String>,
        schema: &Value,
        value: &Value,
        key: Option<&str>,
    ) -> Self {
        Self::Mismatch(ValidationError {
            schema: schema.clone(),
            value: value.clone(),
            message: message.into(),
            key: key.filter(|k| !k.is_empty()).map(str::to_string),
        })
    }
}
