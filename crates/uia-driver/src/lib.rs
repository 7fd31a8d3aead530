//! Automation session boundary
//!
//! This crate defines the capability set the script engine consumes from a
//! live automation session: element lookup by selector, tap/swipe gestures,
//! text input, and app activation. Concrete backends (Appium, a device farm
//! bridge, the in-memory mock) implement [`Driver`] and [`Element`]; the
//! engine never talks to a device any other way.
//!
//! # Key Types
//!
//! - [`Driver`] - session-level operations
//! - [`Element`] - a located UI element handle
//! - [`MockDriver`] - scriptable in-memory session for tests

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockDriver;

/// Errors raised by a session backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("element is not interactable: {selector}")]
    NotInteractable { selector: String },

    #[error("session error: {0}")]
    Backend(String),
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// A point on the device screen, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A swipe gesture between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub from: Point,
    pub to: Point,

    /// Gesture duration in milliseconds
    pub duration_ms: u64,
}

/// A located UI element
///
/// Handles stay valid for the lifetime of the lookup; every operation is a
/// round-trip to the session and may fail.
#[async_trait]
pub trait Element: Send + Sync {
    /// Tap the element
    async fn tap(&self) -> DriverResult<()>;

    /// Whether the element is currently displayed
    async fn is_displayed(&self) -> DriverResult<bool>;

    /// Read the element's text content
    async fn text(&self) -> DriverResult<String>;

    /// Replace the element's value with the given text
    async fn set_value(&self, text: &str) -> DriverResult<()>;
}

/// An automation session
///
/// One `Driver` wraps one device/app session. The engine issues operations
/// strictly in sequence; backends are expected to serialize access to the
/// underlying session themselves.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Look up an element by selector
    async fn find_element(&self, selector: &str) -> DriverResult<Box<dyn Element>>;

    /// Tap at an absolute screen position
    async fn tap(&self, point: Point) -> DriverResult<()>;

    /// Perform a swipe gesture
    async fn swipe(&self, swipe: Swipe) -> DriverResult<()>;

    /// Bring the app with the given id to the foreground
    async fn activate_app(&self, app_id: &str) -> DriverResult<()>;
}
