//! Built-in command kinds
//!
//! The concrete interactions shipped with the engine. Each command
//! deserializes its parameters from the step's attribute bag (cross-cutting
//! attributes like `on_success` ride along and are ignored here) and
//! validates them before anything touches the session.

use crate::{AssertionReport, Command, CommandError, CommandOutput, CommandResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use uia_driver::{Driver, Point, Swipe};

/// Bring an app to the foreground
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchApp {
    pub app_id: String,
}

#[async_trait]
impl Command for LaunchApp {
    fn name(&self) -> &'static str {
        "launch_app"
    }

    fn description(&self) -> &'static str {
        "launch the app with the given id"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.app_id.is_empty() {
            return Err(CommandError::invalid(
                self.name(),
                "app_id must be a non-empty string",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        driver.activate_app(&self.app_id).await?;
        Ok(CommandOutput::none())
    }
}

/// Pause the script for a fixed duration
#[derive(Debug, Clone, Deserialize)]
pub struct Wait {
    /// Duration in milliseconds
    pub duration: i64,
}

#[async_trait]
impl Command for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn description(&self) -> &'static str {
        "wait for the given duration"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.duration < 0 {
            return Err(CommandError::invalid(
                self.name(),
                "duration must be a non-negative number of milliseconds",
            ));
        }
        Ok(())
    }

    async fn execute(&self, _driver: &dyn Driver) -> CommandResult {
        tokio::time::sleep(Duration::from_millis(self.duration as u64)).await;
        Ok(CommandOutput::none())
    }
}

/// Tap an element or an absolute position
#[derive(Debug, Clone, Deserialize)]
pub struct Click {
    #[serde(default)]
    pub selector: Option<String>,

    /// Absolute position `[x, y]`
    #[serde(default)]
    pub pos: Option<[i32; 2]>,
}

impl Click {
    fn selector(&self) -> Option<&str> {
        self.selector.as_deref().filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl Command for Click {
    fn name(&self) -> &'static str {
        "click"
    }

    fn description(&self) -> &'static str {
        "tap the given element or position"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.selector().is_none() && self.pos.is_none() {
            return Err(CommandError::invalid(
                self.name(),
                "at least one of selector, pos is required",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        if let Some(selector) = self.selector() {
            let element = driver.find_element(selector).await?;
            element.tap().await?;
        } else if let Some([x, y]) = self.pos {
            driver.tap(Point::new(x, y)).await?;
        }
        Ok(CommandOutput::none())
    }
}

/// Swipe between two positions
#[derive(Debug, Clone, Deserialize)]
pub struct Scroll {
    /// Start position `[x, y]`
    pub from: [i32; 2],

    /// End position `[x, y]`
    pub to: [i32; 2],

    /// Gesture duration in milliseconds
    #[serde(default)]
    pub duration: Option<i64>,
}

const DEFAULT_SCROLL_DURATION_MS: u64 = 250;

#[async_trait]
impl Command for Scroll {
    fn name(&self) -> &'static str {
        "scroll"
    }

    fn description(&self) -> &'static str {
        "swipe from one position to another"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.duration.is_some_and(|d| d < 0) {
            return Err(CommandError::invalid(
                self.name(),
                "duration must be a non-negative number of milliseconds",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        driver
            .swipe(Swipe {
                from: Point::new(self.from[0], self.from[1]),
                to: Point::new(self.to[0], self.to[1]),
                duration_ms: self
                    .duration
                    .map(|d| d as u64)
                    .unwrap_or(DEFAULT_SCROLL_DURATION_MS),
            })
            .await?;
        Ok(CommandOutput::none())
    }
}

/// Type text into an element
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub selector: String,

    pub text: String,
}

#[async_trait]
impl Command for Input {
    fn name(&self) -> &'static str {
        "input"
    }

    fn description(&self) -> &'static str {
        "type text into the given element"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.selector.is_empty() {
            return Err(CommandError::invalid(
                self.name(),
                "selector must be a non-empty string",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        let element = driver.find_element(&self.selector).await?;
        element.set_value(&self.text).await?;
        Ok(CommandOutput::none())
    }
}

/// Check that an element is displayed
#[derive(Debug, Clone, Deserialize)]
pub struct AssertVisible {
    pub selector: String,

    /// Soft assertions report failure without failing the step
    #[serde(default)]
    pub soft: bool,

    /// Human label surfaced as the report name
    #[serde(default)]
    pub case: String,
}

#[async_trait]
impl Command for AssertVisible {
    fn name(&self) -> &'static str {
        "assertVisible"
    }

    fn description(&self) -> &'static str {
        "assert that the given element is displayed"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.selector.is_empty() {
            return Err(CommandError::invalid(
                self.name(),
                "selector must be a non-empty string",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        let element = driver.find_element(&self.selector).await?;
        let visible = element.is_displayed().await?;
        Ok(CommandOutput::Assertion {
            report: AssertionReport {
                name: self.case.clone(),
                pass: visible,
                expect: Some(Value::Bool(true)),
                actual: Some(Value::Bool(visible)),
            },
            soft: self.soft,
        })
    }
}

/// Check an element's text content against an expected value
#[derive(Debug, Clone, Deserialize)]
pub struct AssertTextEquals {
    pub selector: String,

    /// Expected text content
    pub expect: String,

    #[serde(default)]
    pub soft: bool,

    #[serde(default)]
    pub case: String,
}

#[async_trait]
impl Command for AssertTextEquals {
    fn name(&self) -> &'static str {
        "assertTextEquals"
    }

    fn description(&self) -> &'static str {
        "assert that the given element's text matches the expected value"
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.selector.is_empty() {
            return Err(CommandError::invalid(
                self.name(),
                "selector must be a non-empty string",
            ));
        }
        Ok(())
    }

    async fn execute(&self, driver: &dyn Driver) -> CommandResult {
        let element = driver.find_element(&self.selector).await?;
        let content = element.text().await?;
        Ok(CommandOutput::Assertion {
            report: AssertionReport {
                name: self.case.clone(),
                pass: content == self.expect,
                expect: Some(Value::String(self.expect.clone())),
                actual: Some(Value::String(content)),
            },
            soft: self.soft,
        })
    }
}
