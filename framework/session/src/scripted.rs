//! A scripted browser provider for tests and dry runs.
//!
//! Sessions record every call they receive into a shared event log, and the provider can be
//! told to fail launches or navigations to exercise the orchestrator's error containment.

use std::sync::Arc;
use std::time::Duration;

use crosslane_config::{BrowserConfig, Direction};
use crosslane_core::prelude::BrowserLaunchError;
use parking_lot::Mutex;
use url::Url;

use crate::{BrowserProvider, BrowserSession};

/// Everything a scripted session was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened { browser: String },
    Navigated { browser: String, url: String },
    Scrolled { browser: String, direction: Direction, millis: u128 },
    Closed { browser: String },
}

/// A [BrowserProvider] that opens recording sessions instead of real browsers.
#[derive(Debug, Default, Clone)]
pub struct ScriptedBrowserProvider {
    events: Arc<Mutex<Vec<SessionEvent>>>,
    refuse_launch_for: Arc<Mutex<Vec<String>>>,
    fail_navigation_containing: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBrowserProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every launch of the named browser fail with a [BrowserLaunchError].
    pub fn refuse_launch(&self, browser: &str) {
        self.refuse_launch_for.lock().push(browser.to_string());
    }

    /// Make navigation fail for any URL containing the given fragment.
    pub fn fail_navigation_containing(&self, fragment: &str) {
        self.fail_navigation_containing.lock().push(fragment.to_string());
    }

    /// Snapshot of every event recorded so far, across all sessions.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Number of sessions that were opened.
    pub fn sessions_opened(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, SessionEvent::Opened { .. }))
            .count()
    }
}

impl BrowserProvider for ScriptedBrowserProvider {
    fn open(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, BrowserLaunchError> {
        if self.refuse_launch_for.lock().iter().any(|name| name == &config.name) {
            return Err(BrowserLaunchError {
                browser: config.name.clone(),
                reason: "scripted to refuse launch".to_string(),
            });
        }
        self.events.lock().push(SessionEvent::Opened {
            browser: config.name.clone(),
        });
        Ok(Box::new(ScriptedSession {
            browser: config.name.clone(),
            events: self.events.clone(),
            fail_navigation_containing: self.fail_navigation_containing.clone(),
            closed: false,
        }))
    }
}

struct ScriptedSession {
    browser: String,
    events: Arc<Mutex<Vec<SessionEvent>>>,
    fail_navigation_containing: Arc<Mutex<Vec<String>>>,
    closed: bool,
}

impl BrowserSession for ScriptedSession {
    fn browser_name(&self) -> &str {
        &self.browser
    }

    fn navigate(&mut self, url: &Url) -> anyhow::Result<()> {
        let should_fail = self
            .fail_navigation_containing
            .lock()
            .iter()
            .any(|fragment| url.as_str().contains(fragment.as_str()));
        if should_fail {
            anyhow::bail!("scripted navigation failure for `{url}`");
        }
        self.events.lock().push(SessionEvent::Navigated {
            browser: self.browser.clone(),
            url: url.to_string(),
        });
        Ok(())
    }

    fn scroll(&mut self, direction: Direction, duration: Duration) -> anyhow::Result<()> {
        self.events.lock().push(SessionEvent::Scrolled {
            browser: self.browser.clone(),
            direction,
            millis: duration.as_millis(),
        });
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if !self.closed {
            self.closed = true;
            self.events.lock().push(SessionEvent::Closed {
                browser: self.browser.clone(),
            });
        }
        Ok(())
    }
}
