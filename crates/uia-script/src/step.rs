//! Step and control-action types
//!
//! A step is one named action plus its parameter bag. On the wire a step is
//! a single-key mapping (`- wait: {duration: 100}`); the key is the command
//! name and the value is the open attribute bag. The cross-cutting
//! `on_success` / `on_failure` attributes carry control actions and live in
//! the same bag as the command's own parameters.

use crate::error::EngineError;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Step attribute holding the control action for a successful outcome
pub const ON_SUCCESS: &str = "on_success";

/// Step attribute holding the control action for a failed outcome
pub const ON_FAILURE: &str = "on_failure";

/// One named action within a script body
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Command name (the step's single key)
    pub command: String,

    /// Open attribute bag passed to the command
    pub params: Value,
}

impl Step {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// Whether this step is a label marker (never executes an action)
    pub fn is_label(&self) -> bool {
        self.command == "label"
    }

    /// The label name carried by a `label` step
    pub fn label_name(&self) -> Option<&str> {
        if self.is_label() {
            self.params.as_str()
        } else {
            None
        }
    }

    /// Parse the control action stored under `attr`, if any
    ///
    /// A malformed action shape is a script authoring defect and therefore
    /// fatal, not a recoverable step failure.
    pub fn control_action(&self, attr: &str) -> Result<Option<ControlAction>, EngineError> {
        let Some(raw) = self.params.get(attr) else {
            return Ok(None);
        };
        serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| EngineError::InvalidControlAction(format!("{}: {}", attr, e)))
    }

    /// Control action for a successful outcome
    pub fn on_success(&self) -> Result<Option<ControlAction>, EngineError> {
        self.control_action(ON_SUCCESS)
    }

    /// Control action for a failed outcome
    pub fn on_failure(&self) -> Result<Option<ControlAction>, EngineError> {
        self.control_action(ON_FAILURE)
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.command, &self.params)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::deserialize(deserializer)?;
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((command, params)), None) => Ok(Step { command, params }),
            (None, _) => Err(de::Error::custom("step must contain exactly one command")),
            (Some(_), Some(_)) => Err(de::Error::custom(
                "step must contain exactly one command, found several",
            )),
        }
    }
}

/// The goto/break/return directive attached to a step outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAction {
    pub action: ControlKind,

    /// Goto target label; required iff `action` is `goto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Control action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Jump to a label in the issuing scope
    Goto,

    /// Stop the innermost enclosing loop
    Break,

    /// Exit the enclosing function with the step's result
    Return,
}
