//! The boundary between the orchestration core and concrete browser automation.
//!
//! The core never depends on a specific automation protocol. Anything that can launch a
//! browser, navigate it and interact with the page can implement [BrowserSession] and
//! [BrowserProvider]; a webdriver-backed implementation is the expected production shape.
//! This crate ships a process-level provider good enough for page-load style benchmarks and
//! a scripted provider used by tests and dry runs.

mod process;
pub mod scripted;

use std::time::Duration;

use crosslane_config::{BrowserConfig, Direction};
use crosslane_core::prelude::BrowserLaunchError;
use url::Url;

pub use process::ProcessBrowserProvider;

/// A live browser instance, exclusively owned by the planned run executing against it.
pub trait BrowserSession: Send {
    /// The configured name of the browser this session belongs to.
    fn browser_name(&self) -> &str;

    /// Navigate to a URL and wait for the navigation to be accepted.
    fn navigate(&mut self, url: &Url) -> anyhow::Result<()>;

    /// Scroll the current page in the given direction. The duration bounds the whole
    /// gesture, it is not a poll interval.
    fn scroll(&mut self, direction: Direction, duration: Duration) -> anyhow::Result<()>;

    /// Close the session and release the browser. Called on every exit path.
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Opens browser sessions from a [BrowserConfig].
pub trait BrowserProvider: Send + Sync {
    fn open(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, BrowserLaunchError>;
}
