//! Step and run error taxonomy

use apicheck_core::{SchemaError, ValidationError};
use serde_json::Value;

use crate::transport::TransportError;

/// Failure of a single step. Aborts the rest of its test case only.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("no contract entry for {method} {path}")]
    SpecNotFound { method: String, path: String },

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(String),

    #[error("parameter '{name}': {source}")]
    ParameterSchemaViolation {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("unsupported response content type '{0}'")]
    UnsupportedResponseContentType(String),

    #[error("response violates contract: {message}")]
    ResponseSchemaViolation {
        message: String,
        detail: Option<ValidationError>,
        actual_body: Value,
    },

    #[error("response does not match expectation: {message}")]
    ResponseAssertionMismatch { message: String, actual_body: Value },

    #[error("invalid schema definition: {message}")]
    InvalidSchemaDefinition { message: String, schema: Value },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl StepError {
    /// Taxonomy name used in reports and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SpecNotFound { .. } => "SpecNotFound",
            Self::UnsupportedMethod(_) => "UnsupportedMethod",
            Self::MissingRequiredParameter(_) => "MissingRequiredParameter",
            Self::ParameterSchemaViolation { .. } => "ParameterSchemaViolation",
            Self::UnsupportedResponseContentType(_) => "UnsupportedResponseContentType",
            Self::ResponseSchemaViolation { .. } => "ResponseSchemaViolation",
            Self::ResponseAssertionMismatch { .. } => "ResponseAssertionMismatch",
            Self::InvalidSchemaDefinition { .. } => "InvalidSchemaDefinition",
            Self::Transport(_) => "Transport",
        }
    }

    /// Actual response body, when the failure happened after dispatch.
    #[must_use]
    pub fn actual_body(&self) -> Option<&Value> {
        match self {
            Self::ResponseSchemaViolation { actual_body, .. }
            | Self::ResponseAssertionMismatch { actual_body, .. } => Some(actual_body),
            _ => None,
        }
    }

    /// Extended diagnostics for verbose logging.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let pretty = |v: &Value| serde_json::to_string_pretty(v).unwrap_or_default();
        match self {
            Self::ParameterSchemaViolation { source, .. }
            | Self::ResponseSchemaViolation {
                detail: Some(source),
                ..
            } => Some(format!(
                "schema: {}\nvalue: {}",
                pretty(&source.schema),
                pretty(&source.value)
            )),
            Self::InvalidSchemaDefinition { schema, .. } => {
                Some(format!("schema: {}", pretty(schema)))
            }
            Self::ResponseAssertionMismatch { actual_body, .. } => {
                Some(format!("actual body: {}", pretty(actual_body)))
            }
            _ => None,
        }
    }

    /// Map a schema failure on a request parameter.
    pub(crate) fn from_parameter(name: &str, err: SchemaError) -> Self {
        match err {
            SchemaError::InvalidDefinition { message, schema } => {
                Self::InvalidSchemaDefinition { message, schema }
            }
            SchemaError::Mismatch(source) => Self::ParameterSchemaViolation {
                name: name.to_string(),
                source,
            },
        }
    }

    /// Map a schema failure on a response body.
    pub(crate) fn from_response(err: SchemaError, actual_body: &Value) -> Self {
        match err {
            SchemaError::InvalidDefinition { message, schema } => {
                Self::InvalidSchemaDefinition { message, schema }
            }
            SchemaError::Mismatch(source) => Self::ResponseSchemaViolation {
                message: source.to_string(),
                detail: Some(source),
                actual_body: actual_body.clone(),
            },
        }
    }
}

/// Fatal precondition failures: abort the whole run before any case.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),
    #[error("Invalid test set: {0}")]
    InvalidTestSet(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<apicheck_core::ContractError> for RunError {
    fn from(err: apicheck_core::ContractError) -> Self {
        match err {
            apicheck_core::ContractError::InvalidSpecification(msg) => {
                Self::InvalidSpecification(msg)
            }
        }
    }
}
