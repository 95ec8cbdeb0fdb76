use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::Context;
use crosslane_config::{BrowserConfig, Direction};
use crosslane_core::prelude::BrowserLaunchError;
use url::Url;

use crate::{BrowserProvider, BrowserSession};

/// Drives browsers at the process level: launch the executable with its configured flags,
/// hand it URLs as arguments, and kill it on close.
///
/// Navigation relies on the browser routing a second invocation to the running instance,
/// which all mainstream browsers do. Scrolling cannot be expressed without an automation
/// protocol, so a scroll action degrades to letting the page sit for the scroll duration.
/// Use a webdriver-backed provider where real DOM interaction is needed.
#[derive(Debug, Default)]
pub struct ProcessBrowserProvider;

impl BrowserProvider for ProcessBrowserProvider {
    fn open(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, BrowserLaunchError> {
        let mut command = Command::new(&config.path);
        for flag in &config.flags {
            command.arg(flag.to_string());
        }
        command.arg("about:blank");
        command.stdout(Stdio::null()).stderr(Stdio::null());

        let child = command.spawn().map_err(|e| BrowserLaunchError {
            browser: config.name.clone(),
            reason: format!("failed to spawn `{}`: {e}", config.path.display()),
        })?;

        log::info!(
            "Launched browser `{}` (pid {}) from {}",
            config.name,
            child.id(),
            config.path.display()
        );

        Ok(Box::new(ProcessBrowserSession {
            config: config.clone(),
            child: Some(child),
        }))
    }
}

struct ProcessBrowserSession {
    config: BrowserConfig,
    child: Option<Child>,
}

impl BrowserSession for ProcessBrowserSession {
    fn browser_name(&self) -> &str {
        &self.config.name
    }

    fn navigate(&mut self, url: &Url) -> anyhow::Result<()> {
        let status = Command::new(&self.config.path)
            .args(self.config.flags.iter().map(|flag| flag.to_string()))
            .arg(url.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to hand `{url}` to the running browser"))?;
        if !status.success() {
            anyhow::bail!("browser rejected navigation to `{url}` with {status}");
        }
        Ok(())
    }

    fn scroll(&mut self, direction: Direction, duration: Duration) -> anyhow::Result<()> {
        log::debug!(
            "No automation protocol available, idling {}ms in place of a scroll {}",
            duration.as_millis(),
            direction
        );
        std::thread::sleep(duration);
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if let Some(mut child) = self.child.take() {
            // The process may have exited on its own, in which case kill is a no-op error.
            if let Err(e) = child.kill() {
                log::debug!("Browser `{}` already exited: {e}", self.config.name);
            }
            child
                .wait()
                .with_context(|| format!("failed to reap browser `{}`", self.config.name))?;
        }
        Ok(())
    }
}

impl Drop for ProcessBrowserSession {
    fn drop(&mut self) {
        if self.child.is_some() {
            let _ = self.close();
        }
    }
}
