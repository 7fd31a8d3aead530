//! Engine error taxonomy
//!
//! Script authoring defects are fatal to the whole run and abort it
//! regardless of any `on_failure` handler; they indicate a broken script,
//! not a runtime condition. Command-level failures are not represented
//! here - they are scoped to the failing step and recoverable.

use thiserror::Error;

/// Fatal signals raised by the execution engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// A goto target missing from the issuing scope's label table. Labels
    /// are scope-local; a label defined in an ancestor or descendant scope
    /// is unreachable.
    #[error("label not found: {0}")]
    LabelNotFound(String),

    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("label name must not be empty")]
    EmptyLabel,

    #[error("loop count must be a positive integer, got {0}")]
    InvalidLoopCount(i64),

    #[error("call stack exceeded maximum depth of {0}")]
    StackOverflow(usize),

    #[error("invalid control action: {0}")]
    InvalidControlAction(String),

    #[error("malformed {command} step: {reason}")]
    MalformedStep { command: String, reason: String },
}
