//! Execution result records
//!
//! The engine's entire output contract: one [`StepResult`] per dispatched
//! top-level step, in dispatch order, plus an aggregate [`ExecutionResult`].
//! Nested function and loop bodies collapse into the single entry of the
//! step that invoked them.

use crate::step::Step;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one dispatched step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based ordinal in dispatch order
    pub step: usize,

    /// Command name of the dispatched step
    pub command: String,

    /// The step's parameter bag, echoed for reporting
    pub params: Value,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    pub fn ok(step: usize, source: &Step, result: Value) -> Self {
        Self {
            step,
            command: source.command.clone(),
            params: source.params.clone(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(step: usize, source: &Step, error: impl Into<String>) -> Self {
        Self {
            step,
            command: source.command.clone(),
            params: source.params.clone(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate step counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl Summary {
    fn of(results: &[StepResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

/// The complete outcome of one script run
///
/// `success` reflects whether the run finished: failures recovered through
/// `on_failure` leave it true while still counting as failed in the
/// summary. A fatal error stops the run immediately and is carried in
/// `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,

    pub results: Vec<StepResult>,

    pub summary: Summary,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A run that reached the end of the script
    pub fn completed(results: Vec<StepResult>) -> Self {
        let summary = Summary::of(&results);
        Self {
            success: true,
            results,
            summary,
            error: None,
        }
    }

    /// A run stopped by an unrecovered failure or engine error
    pub fn aborted(results: Vec<StepResult>, error: impl Into<String>) -> Self {
        let summary = Summary::of(&results);
        Self {
            success: false,
            results,
            summary,
            error: Some(error.into()),
        }
    }
}
