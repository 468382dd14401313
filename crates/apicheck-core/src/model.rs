//! Contract and test-set data model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::components::ComponentResolver;

/// The loaded API contract: `paths` plus `components.schemas`.
///
/// Immutable after construction. Path items and schema nodes stay as
/// JSON values; validation walks them directly.
#[derive(Debug, Clone)]
pub struct Contract {
    paths: Map<String, Value>,
    components: ComponentResolver,
}

impl Contract {
    /// Build from a parsed contract document.
    ///
    /// # Errors
    ///
    /// [`ContractError::InvalidSpecification`] when `paths` is missing or
    /// not a mapping.
    pub fn from_value(doc: Value) -> Result<Self, ContractError> {
        let components = ComponentResolver::from_document(&doc);
        let paths = match doc {
            Value::Object(mut root) => match root.remove("paths") {
                Some(Value::Object(paths)) => paths,
                Some(_) => {
                    return Err(ContractError::InvalidSpecification(
                        "`paths` must be a mapping".into(),
                    ));
                }
                None => {
                    return Err(ContractError::InvalidSpecification(
                        "`paths` is missing".into(),
                    ));
                }
            },
            _ => {
                return Err(ContractError::InvalidSpecification(
                    "contract document must be a mapping".into(),
                ));
            }
        };
        Ok(Self { paths, components })
    }

    #[must_use]
    pub fn path_item(&self, path: &str) -> Option<&Value> {
        self.paths.get(path)
    }

    #[must_use]
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    #[must_use]
    pub fn components(&self) -> &ComponentResolver {
        &self.components
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),
}

/// Ordered list of test cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSet {
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// One named sequence of calls sharing a context store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub title: String,
    /// Base URL prefix for every step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_path: Option<String>,
    #[serde(default)]
    pub sequence: Vec<Invoke>,
}

/// One HTTP call of a sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoke {
    /// Contract path key (`/items/{id}`) or an absolute URL
    pub path: String,
    pub method: String,
    /// Canned operation name used when `path` is not in the contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ExpectedResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Parameters are taken out of this body before it is sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Author-supplied expectations, checked independently of the contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<ExpectedHeaders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Either exact per-header values or one assertion template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedHeaders {
    Exact(BTreeMap<String, String>),
    Template(String),
}
