//! Per-test-case record of prior response bodies

use serde_json::Value;

/// Ordered, append-only list of response bodies, one per completed step.
///
/// Created fresh for every test case and dropped when the case ends.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    bodies: Vec<Value>,
}

impl ContextStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the body of the step that just succeeded.
    pub fn push(&mut self, body: Value) {
        self.bodies.push(body);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.bodies.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
