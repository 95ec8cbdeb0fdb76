use chrono::{DateTime, Utc};
use crosslane_config::ActionKind;
use crosslane_core::prelude::{ConfigError, EnvironmentPrecheckError};
use serde::{Deserialize, Serialize};

/// The unique key of one planned run: which browser, which story, which repetition.
///
/// The probe set is not part of the key because all configured probes run together within
/// one session rather than being a plan axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub browser: String,
    pub story: String,
    pub iteration: usize,
}

impl RunKey {
    pub fn new(browser: impl Into<String>, story: impl Into<String>, iteration: usize) -> Self {
        Self {
            browser: browser.into(),
            story: story.into(),
            iteration,
        }
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}[{}]", self.browser, self.story, self.iteration)
    }
}

/// The execution record of one action: what ran, when, and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Ok,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    Failed { reason: String },
}

/// What one probe collected for one run. The payload is probe-specific and opaque here;
/// the report only guarantees attribution and an ok/failed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: String,
    pub key: RunKey,
    pub payload: serde_json::Value,
    pub status: ProbeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed { reason: String },
}

/// The outcome of one planned run: the ordered action log, every probe's result, and the
/// overall status. Failed runs keep their partial data so they remain inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub key: RunKey,
    pub actions: Vec<ActionRecord>,
    pub probes: Vec<ProbeResult>,
    pub status: RunStatus,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}

/// An error that prevented the plan from executing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fatal {
    EnvironmentPrecheck { violations: Vec<String> },
    Config { message: String },
}

impl From<EnvironmentPrecheckError> for Fatal {
    fn from(error: EnvironmentPrecheckError) -> Self {
        Fatal::EnvironmentPrecheck {
            violations: error.violations.iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<ConfigError> for Fatal {
    fn from(error: ConfigError) -> Self {
        Fatal::Config {
            message: error.to_string(),
        }
    }
}

/// The final report of a runner invocation.
///
/// Results are in canonical order: browsers in configuration order, then stories in
/// configuration order, then repetition index, independent of completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub results: Vec<RunResult>,
    pub fatal: Option<Fatal>,
    /// False when the plan was truncated by fail-fast mode or an external stop signal.
    pub complete: bool,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.complete && self.results.iter().all(RunResult::succeeded)
    }

    pub fn failed_runs(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|result| !result.succeeded())
    }
}
