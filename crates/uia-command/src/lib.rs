//! Command contract and registry
//!
//! A command is one logical interaction with the automation session: launch
//! an app, wait, tap, type, or check something on screen. Commands are
//! polymorphic over `{validate, execute}`; the engine resolves them by name
//! through [`CommandRegistry`] and never needs to know concrete kinds, so
//! new interactions are added by registering a variant, not by touching the
//! executor.
//!
//! # Key Types
//!
//! - [`Command`] - the capability set every action kind implements
//! - [`CommandOutput`] - raw value or structured assertion report
//! - [`CommandRegistry`] - name -> constructor lookup

pub mod builtins;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uia_driver::{Driver, DriverError};

pub use builtins::{
    AssertTextEquals, AssertVisible, Click, Input, LaunchApp, Scroll, Wait,
};
pub use registry::CommandRegistry;

/// Errors raised while constructing or executing a command
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("command \"{0}\" is not supported")]
    Unsupported(String),

    #[error("{command} command has invalid parameters: {reason}")]
    InvalidParams { command: String, reason: String },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl CommandError {
    /// Validation failure naming the offending command and parameter
    pub fn invalid(command: impl Into<String>, reason: impl Into<String>) -> Self {
        CommandError::InvalidParams {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for command execution
pub type CommandResult = Result<CommandOutput, CommandError>;

/// Outcome of one assertion, surfaced verbatim in step reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionReport {
    /// Human label from the step's `case` attribute
    pub name: String,

    pub pass: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// What a command produced
///
/// Assertions report their outcome instead of failing on mismatch; the
/// executor decides whether a failed report escalates (hard) or is recorded
/// as-is (soft).
#[derive(Debug, Clone)]
pub enum CommandOutput {
    /// Raw result of a session interaction
    Value(Value),

    /// Structured assertion outcome
    Assertion {
        report: AssertionReport,
        soft: bool,
    },
}

impl CommandOutput {
    /// Null-valued success, for interactions with no meaningful result
    pub fn none() -> Self {
        CommandOutput::Value(Value::Null)
    }
}

/// One logical interaction with the automation session
///
/// `validate` fails fast on malformed parameters, before any side effect.
/// `execute` performs exactly one interaction and never catches its own
/// session failures; those propagate to the executor.
#[async_trait]
pub trait Command: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate(&self) -> Result<(), CommandError>;

    async fn execute(&self, driver: &dyn Driver) -> CommandResult;
}
