//! Canned operations selectable by name when the contract lacks a path

use std::collections::HashMap;

use serde_json::{Value, json};

/// Name of the built-in OAuth 2.0 client-credentials token operation.
pub const OAUTH2_CLIENT_CREDENTIALS: &str = "oauth2.ClientCredentials";

/// Name → `PathItem` registry. Read-only during a run.
#[derive(Debug, Clone, Default)]
pub struct CannedSpecs {
    entries: HashMap<String, Value>,
}

impl CannedSpecs {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in operations.
    #[must_use]
    pub fn builtin() -> Self {
        let mut specs = Self::new();
        specs.register(OAUTH2_CLIENT_CREDENTIALS, oauth2_client_credentials());
        specs
    }

    /// Add or replace a named `PathItem`.
    pub fn register(&mut self, name: impl Into<String>, path_item: Value) {
        self.entries.insert(name.into(), path_item);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

fn oauth2_client_credentials() -> Value {
    json!({
        "post": {
            "responses": {
                "200": {
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "access_token": {"type": "string"},
                                    "token_type": {"type": "string"},
                                    "expires_in": {"type": "integer"},
                                    "scope": {"type": "string"},
                                    "refresh_token": {"type": "string"},
                                    "id_token": {"type": "string"}
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
