//! Project configuration for contract test runs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API contract path (OpenAPI-like, JSON or YAML)
    pub contract: PathBuf,

    /// Test-set path (JSON or YAML)
    pub tests: PathBuf,

    /// Base URL used when neither the step nor the test case sets `contextPath`
    pub base_url: Option<String>,

    /// Default HTTP headers merged under every request's own headers
    pub headers: BTreeMap<String, String>,

    /// Transport timeout in seconds
    pub timeout_secs: u64,

    /// Tracing filter directive, e.g. "info" or "apicheck_runner=debug"
    pub log_level: String,

    /// Extra canned operations: name → PathItem document
    pub canned: HashMap<String, PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: PathBuf::from("openapi.yaml"),
            tests: PathBuf::from("apicheck.tests.yaml"),
            base_url: None,
            headers: BTreeMap::new(),
            timeout_secs: 30,
            log_level: "info".to_string(),
            canned: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apicheck.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apicheck.toml", ".apicheck.json", "apicheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Example config file
    pub fn example() -> &'static str {
        r#"# apicheck configuration

# API contract (OpenAPI-like, JSON or YAML)
contract = "openapi.yaml"

# Test cases (JSON or YAML)
tests = "apicheck.tests.yaml"

# Base URL when a test case has no contextPath
# base_url = "http://localhost:8080"

# Transport timeout in seconds
timeout_secs = 30

# Log filter (overridden by RUST_LOG and --verbose)
log_level = "info"

# Headers sent with every request (a step's own headers win)
[headers]
# Accept = "application/json"

# Extra canned operations, selectable with `spec: <name>` in a step
[canned]
# "internal.Login" = "canned/login.yaml"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
