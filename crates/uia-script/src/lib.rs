//! Script Engine
//!
//! This crate provides the execution engine for scripted UI automation.
//! A script is a sequence of steps - session interactions plus structured
//! control flow (labels, conditional jumps, loops, reusable functions) -
//! executed step by step against an automation session, producing a
//! structured report of what succeeded and what failed.
//!
//! # Step Kinds
//!
//! - Registered commands (launch_app, wait, click, scroll, input, asserts)
//! - `label` - a named goto target, visible only within its scope
//! - `callfunc` - invoke a reusable function body
//! - `loop` - repeat a step sequence a fixed number of times
//!
//! # Key Types
//!
//! - [`Script`] - a complete parsed script
//! - [`ScriptExecutor`] - drives scopes and dispatches steps
//! - [`ExecutionResult`] - the engine's entire output contract

pub mod error;
pub mod executor;
pub mod result;
pub mod scope;
pub mod script;
pub mod step;

pub use error::EngineError;
pub use executor::{ExecutorConfig, ScriptExecutor};
pub use result::{ExecutionResult, StepResult, Summary};
pub use scope::Scope;
pub use script::{FunctionDef, Script, ScriptError};
pub use step::{ControlAction, ControlKind, Step};
