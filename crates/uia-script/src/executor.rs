//! Script executor
//!
//! Drives a parsed script against an automation session. The executor owns
//! an explicit scope stack; the root scope lives for the whole run while
//! function and loop scopes are pushed on entry and popped on every exit
//! path. One dispatch loop serves all three scope kinds - per-step outcome
//! handling and control-action resolution are identical at the root, inside
//! a function body, and inside a loop body.
//!
//! Control actions resolve strictly within the scope that issued them:
//! `goto` looks up the current scope's label table only, `break` stops the
//! innermost loop, `return` exits the enclosing function. `break` with no
//! enclosing loop and `return` outside a function are a documented no-op
//! and advance to the next step.

use crate::error::EngineError;
use crate::result::{ExecutionResult, StepResult};
use crate::scope::Scope;
use crate::script::{FunctionDef, Script};
use crate::step::{ControlAction, ControlKind, Step};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uia_command::{CommandOutput, CommandRegistry};
use uia_driver::Driver;

/// Executor tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum scope-stack depth; exceeding it aborts the run with a
    /// stack-overflow signal instead of recursing without bound
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
}

fn default_max_call_depth() -> usize {
    64
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_call_depth: default_max_call_depth(),
        }
    }
}

/// How a dispatched step failed
#[derive(Debug)]
enum StepError {
    /// Scoped to the step; recoverable through `on_failure`
    Failed(String),

    /// Script authoring defect; aborts the run regardless of handlers
    Fatal(EngineError),
}

impl From<EngineError> for StepError {
    fn from(error: EngineError) -> Self {
        StepError::Fatal(error)
    }
}

/// Which kind of scope the dispatch loop is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Function,
    Loop,
}

/// Where a resolved control action sends the cursor
#[derive(Debug)]
enum Flow {
    Next,
    Jump(usize),
    Break,
    Return,
}

/// How a scope's dispatch loop ended
#[derive(Debug)]
enum ScopeOutcome {
    /// Cursor ran off the end of the step sequence
    Completed,

    /// A break stopped the loop, carrying the last available result
    Broke(Value),

    /// A return exited the function with the step's result
    Returned(Value),
}

/// `callfunc` step parameters
#[derive(Debug, Deserialize)]
struct CallFuncParams {
    name: String,
}

/// `loop` step parameters
#[derive(Debug, Deserialize)]
struct LoopParams {
    count: i64,
    steps: Vec<Step>,
}

/// Executes one script against one automation session
///
/// The scope stack and function table are private, single-owner state; an
/// executor must not be asked to run two scripts concurrently.
pub struct ScriptExecutor {
    driver: Arc<dyn Driver>,
    registry: Arc<CommandRegistry>,
    script: Script,
    functions: IndexMap<String, FunctionDef>,
    stack: Vec<Scope>,
    results: Vec<StepResult>,
    config: ExecutorConfig,
}

impl ScriptExecutor {
    /// Create an executor with the built-in command set
    pub fn new(driver: Arc<dyn Driver>, script: Script) -> Self {
        Self::with_config(driver, script, ExecutorConfig::default())
    }

    pub fn with_config(driver: Arc<dyn Driver>, script: Script, config: ExecutorConfig) -> Self {
        let functions = script.function_table();
        Self {
            driver,
            registry: Arc::new(CommandRegistry::with_builtins()),
            script,
            functions,
            stack: Vec::new(),
            results: Vec::new(),
            config,
        }
    }

    /// Replace the command registry, e.g. to add custom commands
    pub fn with_registry(mut self, registry: Arc<CommandRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Run the script to completion and report every dispatched step
    pub async fn execute(&mut self) -> ExecutionResult {
        debug!(
            script = %self.script.display_name(),
            steps = self.script.steps.len(),
            functions = self.functions.len(),
            "executing script"
        );
        self.results.clear();
        self.stack.clear();

        let run = self.run_root().await;
        let results = std::mem::take(&mut self.results);

        match run {
            Ok(()) => {
                debug!(steps = results.len(), "script finished");
                ExecutionResult::completed(results)
            }
            Err(message) => {
                warn!(error = %message, "script aborted");
                ExecutionResult::aborted(results, message)
            }
        }
    }

    async fn run_root(&mut self) -> Result<(), String> {
        let root =
            Scope::new("root", self.script.steps.clone()).map_err(|e| e.to_string())?;
        self.stack.push(root);
        let outcome = self.run_scope(ScopeKind::Root).await;
        self.stack.pop();

        match outcome {
            Ok(_) => Ok(()),
            Err(StepError::Failed(message)) => Err(message),
            Err(StepError::Fatal(error)) => Err(error.to_string()),
        }
    }

    /// The dispatch loop, shared by root, function, and loop scopes
    ///
    /// Operates on the scope currently on top of the stack. Only root-level
    /// steps are recorded: a `callfunc` or `loop` step collapses its whole
    /// body into the one entry recorded at the call site.
    fn run_scope(
        &mut self,
        kind: ScopeKind,
    ) -> Pin<Box<dyn Future<Output = Result<ScopeOutcome, StepError>> + Send + '_>> {
        Box::pin(async move {
            loop {
                let step = match self.stack.last().and_then(Scope::current) {
                    Some(step) => step.clone(),
                    None => return Ok(ScopeOutcome::Completed),
                };

                match self.dispatch_step(&step).await {
                    Ok(result) => {
                        if kind == ScopeKind::Root {
                            self.record(StepResult::ok(
                                self.results.len() + 1,
                                &step,
                                result.clone(),
                            ));
                        }
                        let flow = match step.on_success()? {
                            Some(action) => self.resolve_action(&action)?,
                            None => Flow::Next,
                        };
                        if let Some(outcome) = self.apply_flow(kind, flow, result) {
                            return Ok(outcome);
                        }
                    }
                    Err(StepError::Failed(message)) => {
                        if kind == ScopeKind::Root {
                            self.record(StepResult::failed(
                                self.results.len() + 1,
                                &step,
                                message.clone(),
                            ));
                        }
                        let Some(action) = step.on_failure()? else {
                            return Err(StepError::Failed(message));
                        };
                        warn!(
                            command = %step.command,
                            error = %message,
                            "step failed, resolving on_failure"
                        );
                        let flow = self.resolve_action(&action)?;
                        if let Some(outcome) =
                            self.apply_flow(kind, flow, Value::String(message))
                        {
                            return Ok(outcome);
                        }
                    }
                    Err(StepError::Fatal(error)) => {
                        if kind == ScopeKind::Root {
                            self.record(StepResult::failed(
                                self.results.len() + 1,
                                &step,
                                error.to_string(),
                            ));
                        }
                        return Err(StepError::Fatal(error));
                    }
                }
            }
        })
    }

    async fn dispatch_step(&mut self, step: &Step) -> Result<Value, StepError> {
        trace!(command = %step.command, params = %step.params, "dispatching step");
        match step.command.as_str() {
            // A label never executes an action; its result is informational
            "label" => Ok(Value::Null),
            "callfunc" => self.call_function(&step.params).await,
            "loop" => self.run_loop(&step.params).await,
            name => self.run_command(name, &step.params).await,
        }
    }

    async fn run_command(&mut self, name: &str, params: &Value) -> Result<Value, StepError> {
        let command = self
            .registry
            .create(name, params.clone())
            .map_err(|e| StepError::Failed(e.to_string()))?;

        let output = command
            .execute(self.driver.as_ref())
            .await
            .map_err(|e| StepError::Failed(e.to_string()))?;

        match output {
            CommandOutput::Value(value) => Ok(value),
            CommandOutput::Assertion { report, soft } => {
                let escalate = !report.pass && !soft;
                if escalate {
                    return Err(StepError::Failed(format!(
                        "assertion \"{}\" failed: expected {}, actual {}",
                        report.name,
                        report.expect.clone().unwrap_or(Value::Null),
                        report.actual.clone().unwrap_or(Value::Null),
                    )));
                }
                serde_json::to_value(&report).map_err(|e| StepError::Failed(e.to_string()))
            }
        }
    }

    async fn call_function(&mut self, params: &Value) -> Result<Value, StepError> {
        let params: CallFuncParams =
            serde_json::from_value(params.clone()).map_err(|e| EngineError::MalformedStep {
                command: "callfunc".to_string(),
                reason: e.to_string(),
            })?;

        let function = self
            .functions
            .get(&params.name)
            .cloned()
            .ok_or_else(|| EngineError::FunctionNotFound(params.name.clone()))?;

        if self.stack.len() >= self.config.max_call_depth {
            return Err(EngineError::StackOverflow(self.config.max_call_depth).into());
        }

        debug!(function = %params.name, depth = self.stack.len(), "calling function");
        let scope = Scope::new(params.name, function.steps)?;
        self.stack.push(scope);
        let outcome = self.run_scope(ScopeKind::Function).await;
        self.stack.pop();

        match outcome? {
            ScopeOutcome::Completed => Ok(Value::Null),
            ScopeOutcome::Returned(value) | ScopeOutcome::Broke(value) => Ok(value),
        }
    }

    async fn run_loop(&mut self, params: &Value) -> Result<Value, StepError> {
        let params: LoopParams =
            serde_json::from_value(params.clone()).map_err(|e| EngineError::MalformedStep {
                command: "loop".to_string(),
                reason: e.to_string(),
            })?;

        if params.count <= 0 {
            return Err(EngineError::InvalidLoopCount(params.count).into());
        }

        debug!(count = params.count, "entering loop");
        let scope = Scope::new("loop", params.steps)?;
        self.stack.push(scope);
        let outcome = self.run_iterations(params.count as u64).await;
        self.stack.pop();
        outcome
    }

    async fn run_iterations(&mut self, count: u64) -> Result<Value, StepError> {
        for iteration in 0..count {
            if let Some(scope) = self.stack.last_mut() {
                scope.reset();
            }
            trace!(iteration, "loop iteration");
            match self.run_scope(ScopeKind::Loop).await? {
                ScopeOutcome::Completed => {}
                ScopeOutcome::Broke(value) | ScopeOutcome::Returned(value) => {
                    debug!(iteration, "loop stopped early");
                    return Ok(value);
                }
            }
        }
        Ok(Value::Null)
    }

    /// Resolve a control action against the current scope
    fn resolve_action(&self, action: &ControlAction) -> Result<Flow, StepError> {
        match action.action {
            ControlKind::Goto => {
                let target = action
                    .target
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        EngineError::InvalidControlAction(
                            "goto requires a target label".to_string(),
                        )
                    })?;
                let index = self
                    .stack
                    .last()
                    .and_then(|scope| scope.find_label(target))
                    .ok_or_else(|| EngineError::LabelNotFound(target.to_string()))?;
                debug!(label = target, index, "goto");
                Ok(Flow::Jump(index))
            }
            ControlKind::Break => Ok(Flow::Break),
            ControlKind::Return => Ok(Flow::Return),
        }
    }

    /// Move the cursor for `flow`, or yield the outcome that ends the scope
    fn apply_flow(&mut self, kind: ScopeKind, flow: Flow, value: Value) -> Option<ScopeOutcome> {
        match flow {
            Flow::Next => {
                self.advance_cursor();
                None
            }
            Flow::Jump(index) => {
                if let Some(scope) = self.stack.last_mut() {
                    scope.set_cursor(index);
                }
                None
            }
            Flow::Break => match kind {
                ScopeKind::Loop => Some(ScopeOutcome::Broke(value)),
                ScopeKind::Root | ScopeKind::Function => {
                    debug!("break with no enclosing loop, continuing");
                    self.advance_cursor();
                    None
                }
            },
            Flow::Return => match kind {
                ScopeKind::Function => Some(ScopeOutcome::Returned(value)),
                // Inside a loop body a return behaves as a break
                ScopeKind::Loop => Some(ScopeOutcome::Broke(value)),
                ScopeKind::Root => {
                    debug!("return outside function, continuing");
                    self.advance_cursor();
                    None
                }
            },
        }
    }

    fn advance_cursor(&mut self) {
        if let Some(scope) = self.stack.last_mut() {
            scope.advance();
        }
    }

    fn record(&mut self, result: StepResult) {
        self.results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uia_driver::MockDriver;

    fn executor_for(yaml: &str) -> (ScriptExecutor, MockDriver) {
        let driver = MockDriver::new();
        let script = Script::from_yaml_str(yaml).expect("test script must parse");
        (
            ScriptExecutor::new(Arc::new(driver.clone()), script),
            driver,
        )
    }

    #[test]
    fn test_config_default_depth() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_call_depth, 64);

        let config: ExecutorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_call_depth, 64);
    }

    #[tokio::test]
    async fn test_straight_line_script() {
        let (mut executor, driver) = executor_for(
            r#"
steps:
  - launch_app: { app_id: "com.example.app" }
  - wait: { duration: 1 }
"#,
        );

        let outcome = executor.execute().await;
        assert!(outcome.success);
        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.successful, 2);
        assert_eq!(driver.actions(), vec!["activate com.example.app"]);
    }

    #[tokio::test]
    async fn test_label_step_is_a_no_op() {
        let (mut executor, driver) = executor_for(
            r#"
steps:
  - label: "start"
  - wait: { duration: 1 }
"#,
        );

        let outcome = executor.execute().await;
        assert!(outcome.success);
        assert_eq!(outcome.results[0].command, "label");
        assert_eq!(outcome.results[0].result, Some(Value::Null));
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn test_unrecovered_failure_stops_immediately() {
        let (mut executor, driver) = executor_for(
            r#"
steps:
  - click: { selector: "button.missing" }
  - launch_app: { app_id: "com.example.app" }
"#,
        );

        let outcome = executor.execute().await;
        assert!(!outcome.success);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome
            .error
            .as_deref()
            .is_some_and(|e| e.contains("button.missing")));
        // The step after the failing one never ran
        assert!(!driver
            .actions()
            .contains(&"activate com.example.app".to_string()));
    }
}
