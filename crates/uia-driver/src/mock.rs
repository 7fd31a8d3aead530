//! In-memory mock session
//!
//! A scriptable [`Driver`] used by the engine's test suites. Element
//! presence and text are configured per selector; every interaction is
//! appended to an action log that tests can assert against. Interactions
//! with an element that is not present fail the way a live session would.

use crate::{Driver, DriverError, DriverResult, Element, Point, Swipe};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct MockElementSpec {
    displayed: bool,
    text: String,
}

#[derive(Debug, Default)]
struct MockState {
    elements: Mutex<HashMap<String, MockElementSpec>>,
    log: Mutex<Vec<String>>,
}

impl MockState {
    fn record(&self, action: impl Into<String>) {
        self.log.lock().unwrap().push(action.into());
    }

    fn spec(&self, selector: &str) -> MockElementSpec {
        self.elements
            .lock()
            .unwrap()
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }
}

/// Scriptable in-memory automation session
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `selector` resolvable (or not) for subsequent lookups
    pub fn set_element(&self, selector: &str, displayed: bool) {
        self.state
            .elements
            .lock()
            .unwrap()
            .entry(selector.to_string())
            .or_default()
            .displayed = displayed;
    }

    /// Set the text reported for `selector`
    pub fn set_text(&self, selector: &str, text: &str) {
        let mut elements = self.state.elements.lock().unwrap();
        let spec = elements.entry(selector.to_string()).or_default();
        spec.displayed = true;
        spec.text = text.to_string();
    }

    /// All interactions performed so far, in order
    pub fn actions(&self) -> Vec<String> {
        self.state.log.lock().unwrap().clone()
    }

    pub fn clear_actions(&self) {
        self.state.log.lock().unwrap().clear();
    }
}

struct MockElement {
    selector: String,
    spec: MockElementSpec,
    state: Arc<MockState>,
}

impl MockElement {
    fn present(&self) -> DriverResult<()> {
        if self.spec.displayed {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound {
                selector: self.selector.clone(),
            })
        }
    }
}

#[async_trait]
impl Element for MockElement {
    async fn tap(&self) -> DriverResult<()> {
        self.present()?;
        self.state.record(format!("tap {}", self.selector));
        Ok(())
    }

    async fn is_displayed(&self) -> DriverResult<bool> {
        self.state.record(format!("displayed? {}", self.selector));
        Ok(self.spec.displayed)
    }

    async fn text(&self) -> DriverResult<String> {
        self.present()?;
        self.state.record(format!("text {}", self.selector));
        Ok(self.spec.text.clone())
    }

    async fn set_value(&self, text: &str) -> DriverResult<()> {
        self.present()?;
        self.state
            .record(format!("input {} = {}", self.selector, text));
        Ok(())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn find_element(&self, selector: &str) -> DriverResult<Box<dyn Element>> {
        self.state.record(format!("find {}", selector));
        Ok(Box::new(MockElement {
            selector: selector.to_string(),
            spec: self.state.spec(selector),
            state: self.state.clone(),
        }))
    }

    async fn tap(&self, point: Point) -> DriverResult<()> {
        self.state.record(format!("tap ({}, {})", point.x, point.y));
        Ok(())
    }

    async fn swipe(&self, swipe: Swipe) -> DriverResult<()> {
        self.state.record(format!(
            "swipe ({}, {}) -> ({}, {}) in {}ms",
            swipe.from.x, swipe.from.y, swipe.to.x, swipe.to.y, swipe.duration_ms
        ));
        Ok(())
    }

    async fn activate_app(&self, app_id: &str) -> DriverResult<()> {
        self.state.record(format!("activate {}", app_id));
        Ok(())
    }
}
