//! Execution scopes
//!
//! A scope is one execution context - the root body, a function body, or a
//! loop body - with its own step sequence, label table, and cursor. The
//! label table is built once at construction; labels are visible only
//! within the scope that defines them, never across scope boundaries.

use crate::error::EngineError;
use crate::step::Step;
use std::collections::HashMap;

/// One execution context on the scope stack
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    steps: Vec<Step>,
    labels: HashMap<String, usize>,
    cursor: usize,
}

impl Scope {
    /// Create a scope over its own step sequence
    ///
    /// Scans for `label` steps and records their positions. An empty or
    /// duplicate label name fails construction.
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Result<Self, EngineError> {
        let mut labels = HashMap::new();
        for (index, step) in steps.iter().enumerate() {
            if !step.is_label() {
                continue;
            }
            let label = step.label_name().unwrap_or_default();
            if label.is_empty() {
                return Err(EngineError::EmptyLabel);
            }
            if labels.insert(label.to_string(), index).is_some() {
                return Err(EngineError::DuplicateLabel(label.to_string()));
            }
        }

        Ok(Self {
            name: name.into(),
            steps,
            labels,
            cursor: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the cursor has run off the end of the step sequence
    pub fn is_done(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// The step under the cursor, if any
    pub fn current(&self) -> Option<&Step> {
        self.steps.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
    }

    /// Advance the cursor by one step
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Rewind to the first step, for the next loop iteration
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Position of a label within this scope only
    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wait_step(ms: i64) -> Step {
        Step::new("wait", json!({ "duration": ms }))
    }

    fn label_step(name: &str) -> Step {
        Step::new("label", json!(name))
    }

    #[test]
    fn test_label_table_built_at_construction() {
        let scope = Scope::new(
            "root",
            vec![wait_step(1), label_step("a"), wait_step(2), label_step("b")],
        )
        .unwrap();

        assert_eq!(scope.find_label("a"), Some(1));
        assert_eq!(scope.find_label("b"), Some(3));
        assert_eq!(scope.find_label("missing"), None);
    }

    #[test]
    fn test_duplicate_label_fails_construction() {
        let err = Scope::new("root", vec![label_step("a"), label_step("a")]).unwrap_err();
        assert_eq!(err, EngineError::DuplicateLabel("a".to_string()));
    }

    #[test]
    fn test_empty_label_fails_construction() {
        let err = Scope::new("root", vec![label_step("")]).unwrap_err();
        assert_eq!(err, EngineError::EmptyLabel);

        // A label whose value is not a string is just as empty
        let err = Scope::new("root", vec![Step::new("label", json!(null))]).unwrap_err();
        assert_eq!(err, EngineError::EmptyLabel);
    }

    #[test]
    fn test_cursor_state_machine() {
        let mut scope = Scope::new("root", vec![wait_step(1), wait_step(2)]).unwrap();

        assert!(!scope.is_done());
        assert_eq!(scope.cursor(), 0);

        scope.advance();
        assert!(!scope.is_done());
        scope.advance();
        assert!(scope.is_done());
        assert!(scope.current().is_none());

        scope.reset();
        assert_eq!(scope.cursor(), 0);
        assert!(!scope.is_done());
    }
}
