//! Named reusable schema lookup for `$ref` indirection

use serde_json::{Map, Value};

/// The only reference shape that resolves.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Read-only registry of `components.schemas`.
#[derive(Debug, Clone, Default)]
pub struct ComponentResolver {
    schemas: Map<String, Value>,
}

impl ComponentResolver {
    #[must_use]
    pub fn new(schemas: Map<String, Value>) -> Self {
        Self { schemas }
    }

    /// Build from a whole contract document (`components.schemas`).
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let schemas = doc
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
            .cloned()
            .unwrap_or_default();
        Self::new(schemas)
    }

    /// Resolve `#/components/schemas/<name>`. Any other shape yields `None`.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<&Value> {
        let name = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        self.schemas.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
