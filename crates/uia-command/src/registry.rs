//! Command registry
//!
//! Maps command names to constructors. The engine resolves every non-control
//! step through here; unknown names are a typed error, and construction
//! validates parameters immediately so a malformed step fails before any
//! side effect.

use crate::{
    AssertTextEquals, AssertVisible, Click, Command, CommandError, Input, LaunchApp, Scroll, Wait,
};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Constructor for one command kind
pub type CommandFactory =
    Arc<dyn Fn(Value) -> Result<Box<dyn Command>, CommandError> + Send + Sync>;

/// Name -> constructor lookup for command kinds
///
/// New interactions are added by registering a variant; the executor is
/// never modified.
pub struct CommandRegistry {
    commands: DashMap<String, CommandFactory>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            commands: DashMap::new(),
        }
    }

    /// Create a registry with all built-in commands registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register::<LaunchApp>("launch_app");
        registry.register::<Wait>("wait");
        registry.register::<Click>("click");
        registry.register::<Scroll>("scroll");
        registry.register::<Input>("input");
        registry.register::<AssertVisible>("assertVisible");
        registry.register::<AssertTextEquals>("assertTextEquals");
        registry
    }

    /// Register a command kind that constructs itself from step parameters
    pub fn register<C>(&self, name: &str)
    where
        C: Command + DeserializeOwned + 'static,
    {
        let command_name = name.to_string();
        self.register_factory(
            name,
            Arc::new(move |params: Value| {
                let command: C =
                    serde_json::from_value(params).map_err(|e| CommandError::InvalidParams {
                        command: command_name.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(Box::new(command) as Box<dyn Command>)
            }),
        );
    }

    /// Register a command kind with an explicit constructor
    pub fn register_factory(&self, name: &str, factory: CommandFactory) {
        debug!(command = %name, "registering command");
        self.commands.insert(name.to_string(), factory);
    }

    /// Whether a command name is registered
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// All registered command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.commands.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Construct and validate a command from a step's parameters
    ///
    /// Fails with [`CommandError::Unsupported`] for unknown names, and with
    /// the command's own validation error for malformed parameters.
    pub fn create(&self, name: &str, params: Value) -> Result<Box<dyn Command>, CommandError> {
        let factory = self
            .commands
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CommandError::Unsupported(name.to_string()))?;

        debug!(command = %name, "creating command");
        let command = factory(params)?;
        command.validate()?;
        Ok(command)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
