//! Contract and test-set loading (JSON or YAML)

use std::path::Path;

use apicheck_core::{Contract, TestSet};
use serde_json::Value;

use crate::error::RunError;

/// Read and parse a JSON or YAML document.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, RunError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RunError::Io(format!("{}: {e}", path.display())))?;
    parse_document(path, &content)
}

/// Parse a document from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`/`.json`), then fall
/// back to content sniffing (leading `{` → JSON, otherwise YAML).
///
/// # Errors
///
/// Returns [`RunError::Parse`] on malformed content.
pub fn parse_document(path: &Path, content: &str) -> Result<Value, RunError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse_json = |c: &str| -> Result<Value, RunError> {
        serde_json::from_str(c).map_err(|e| RunError::Parse(format!("Invalid JSON: {e}")))
    };
    let parse_yaml = |c: &str| -> Result<Value, RunError> {
        serde_yml::from_str(c).map_err(|e| RunError::Parse(format!("Invalid YAML: {e}")))
    };

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ if content.trim_start().starts_with('{') => parse_json(content),
        _ => parse_yaml(content),
    }
}

/// Load the API contract.
///
/// # Errors
///
/// I/O and parse errors, or [`RunError::InvalidSpecification`].
pub fn load_contract(path: &Path) -> Result<Contract, RunError> {
    let doc = load_document(path)?;
    Ok(Contract::from_value(doc)?)
}

/// Load a test set. An absent or empty `testCases` list is rejected.
///
/// # Errors
///
/// I/O and parse errors, or [`RunError::InvalidTestSet`].
pub fn load_test_set(path: &Path) -> Result<TestSet, RunError> {
    test_set_from_value(load_document(path)?)
}

/// # Errors
///
/// [`RunError::InvalidTestSet`] when the shape is wrong or has no cases.
pub fn test_set_from_value(doc: Value) -> Result<TestSet, RunError> {
    let set: TestSet =
        serde_json::from_value(doc).map_err(|e| RunError::InvalidTestSet(e.to_string()))?;
    if set.test_cases.is_empty() {
        return Err(RunError::InvalidTestSet(
            "`testCases` is missing or empty".into(),
        ));
    }
    Ok(set)
}
