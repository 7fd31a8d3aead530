//! Script definition and loading
//!
//! A script is a named sequence of steps plus reusable function bodies.
//! The engine only requires this structured shape; the textual source is
//! YAML or JSON and loads through serde. Structural defects (no steps,
//! duplicate function names, steps that are not single-key mappings) fail
//! at load, before anything touches a session.

use crate::step::Step;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uia_command::CommandRegistry;

/// Errors raised while loading or validating a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("script must contain at least one step")]
    NoSteps,

    #[error("function name must not be empty")]
    EmptyFunctionName,

    #[error("duplicate function definition: {0}")]
    DuplicateFunction(String),

    #[error("step {step} ({command}): {reason}")]
    InvalidStep {
        step: usize,
        command: String,
        reason: String,
    },
}

/// A reusable step sequence, callable by name via `callfunc`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,

    pub steps: Vec<Step>,
}

/// A complete parsed script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Function definitions; names are unique within one script
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDef>,

    /// Top-level step sequence
    pub steps: Vec<Step>,
}

impl Script {
    /// Load and validate a script from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_yaml::from_str(yaml)?;
        script.validate()?;
        Ok(script)
    }

    /// Load and validate a script from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Structural validation, applied by both loaders
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.steps.is_empty() {
            return Err(ScriptError::NoSteps);
        }

        let mut seen = indexmap::IndexSet::new();
        for function in &self.functions {
            if function.name.is_empty() {
                return Err(ScriptError::EmptyFunctionName);
            }
            if !seen.insert(function.name.as_str()) {
                return Err(ScriptError::DuplicateFunction(function.name.clone()));
            }
        }

        Ok(())
    }

    /// Function table keyed by name, in definition order
    pub fn function_table(&self) -> IndexMap<String, FunctionDef> {
        self.functions
            .iter()
            .map(|f| (f.name.clone(), f.clone()))
            .collect()
    }

    /// Eagerly construct every top-level non-control command
    ///
    /// Lets callers reject a script whose commands are unknown or malformed
    /// before starting a session. Function and loop bodies still validate
    /// at dispatch.
    pub fn check_commands(&self, registry: &CommandRegistry) -> Result<(), ScriptError> {
        for (index, step) in self.steps.iter().enumerate() {
            if matches!(step.command.as_str(), "label" | "callfunc" | "loop") {
                continue;
            }
            registry
                .create(&step.command, step.params.clone())
                .map_err(|e| ScriptError::InvalidStep {
                    step: index + 1,
                    command: step.command.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Display name for logs and reports
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed script")
    }
}
