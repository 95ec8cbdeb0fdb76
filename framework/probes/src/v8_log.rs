use std::path::PathBuf;

use crosslane_config::{Flag, ProbeConfig};
use crosslane_core::prelude::{ConfigError, Executor, ProbeError};
use crosslane_report::RunKey;
use crosslane_session::BrowserSession;

use crate::{Probe, ProbeHandle};

/// Collects a V8 engine log by injecting `--js-flags` at browser launch.
///
/// The heavy lifting happens inside the browser; this probe only contributes the launch
/// flags and reports where the log ends up. Parsing the log is a separate concern.
#[derive(Debug)]
pub struct V8LogProbe {
    required: bool,
    prof: bool,
    logfile: PathBuf,
    extra_js_flags: Vec<String>,
}

impl V8LogProbe {
    pub const NAME: &'static str = "v8.log";

    pub fn from_config(config: &ProbeConfig) -> Result<Self, ConfigError> {
        let mut prof = false;
        let mut logfile = PathBuf::from("v8.log");
        let mut extra_js_flags = Vec::new();

        for (param, value) in &config.params {
            match param.as_str() {
                "prof" => {
                    prof = value.as_bool().ok_or_else(|| invalid_param(param, value))?;
                }
                "logfile" => {
                    logfile = value
                        .as_str()
                        .map(PathBuf::from)
                        .ok_or_else(|| invalid_param(param, value))?;
                }
                "js_flags" => {
                    let flags = value.as_array().ok_or_else(|| invalid_param(param, value))?;
                    for flag in flags {
                        let flag = flag.as_str().ok_or_else(|| invalid_param(param, flag))?;
                        extra_js_flags.push(flag.to_string());
                    }
                }
                other => {
                    return Err(ConfigError::InvalidProbeParam {
                        probe: Self::NAME.to_string(),
                        param: other.to_string(),
                        reason: "unknown parameter".to_string(),
                    })
                }
            }
        }

        Ok(Self {
            required: config.required,
            prof,
            logfile,
            extra_js_flags,
        })
    }

    /// The log path for one run. Every run gets its own file so repetitions and sibling
    /// browser/story combinations never overwrite each other's logs.
    fn run_logfile(&self, key: &RunKey) -> PathBuf {
        let name = self
            .logfile
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "v8.log".to_string());
        self.logfile.with_file_name(format!(
            "{}_{}_{}_{name}",
            sanitize(&key.browser),
            sanitize(&key.story),
            key.iteration,
        ))
    }

    fn js_flags(&self, key: &RunKey) -> Vec<String> {
        let mut flags = vec![
            "--log".to_string(),
            format!("--logfile={}", self.run_logfile(key).display()),
        ];
        if self.prof {
            flags.push("--prof".to_string());
        }
        flags.extend(self.extra_js_flags.iter().cloned());
        flags
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '-' })
        .collect()
}

fn invalid_param(param: &str, value: &serde_json::Value) -> ConfigError {
    ConfigError::InvalidProbeParam {
        probe: V8LogProbe::NAME.to_string(),
        param: param.to_string(),
        reason: format!("unexpected value {value}"),
    }
}

impl Probe for V8LogProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required(&self) -> bool {
        self.required
    }

    fn launch_flags(&self, key: &RunKey) -> Vec<Flag> {
        vec![Flag::Value {
            key: "--js-flags".to_string(),
            value: self.js_flags(key).join(","),
        }]
    }

    fn attach(
        &self,
        key: &RunKey,
        _session: &mut dyn BrowserSession,
        _executor: &Executor,
    ) -> Result<Box<dyn ProbeHandle>, ProbeError> {
        Ok(Box::new(V8LogHandle {
            logfile: self.run_logfile(key),
            js_flags: self.js_flags(key),
        }))
    }
}

struct V8LogHandle {
    logfile: PathBuf,
    js_flags: Vec<String>,
}

impl ProbeHandle for V8LogHandle {
    fn start(&mut self, _executor: &Executor) -> Result<(), ProbeError> {
        Ok(())
    }

    fn stop(&mut self, _executor: &Executor) -> Result<(), ProbeError> {
        Ok(())
    }

    fn collect(&mut self, _executor: &Executor) -> Result<serde_json::Value, ProbeError> {
        Ok(serde_json::json!({
            "logfile": self.logfile.display().to_string(),
            "js_flags": self.js_flags,
        }))
    }
}
