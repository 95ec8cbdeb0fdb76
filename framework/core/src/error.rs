use thiserror::Error;

/// A malformed story, browser, or probe configuration.
///
/// These are detected eagerly while loading configuration so that a bad document is rejected
/// before any browser session exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown action kind `{kind}` in story `{story}`")]
    UnknownActionKind { story: String, kind: String },

    #[error("`{kind}` action in story `{story}` is missing required field `{field}`")]
    MissingActionField {
        story: String,
        kind: String,
        field: &'static str,
    },

    #[error("invalid duration `{value}`: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("invalid URL `{value}`: {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("unknown story `{name}`")]
    UnknownStory { name: String },

    #[error("unknown browser `{name}`")]
    UnknownBrowser { name: String },

    #[error("unknown probe `{name}`, known probes are: {known}")]
    UnknownProbe { name: String, known: String },

    #[error("probe `{probe}` has an invalid `{param}` parameter: {reason}")]
    InvalidProbeParam {
        probe: String,
        param: String,
        reason: String,
    },

    #[error("malformed configuration document: {0}")]
    Document(String),
}

/// One failed host-state check from the environment precheck.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The policy option that was violated, e.g. `disk_min_free_space_gib`.
    pub option: String,
    /// Human readable description of the mismatch, including a remediation hint where possible.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.option, self.message)
    }
}

/// The host environment did not satisfy the declared policy.
///
/// Carries every violation found, not just the first, so that an operator can fix all issues
/// in one pass. Fatal to the whole runner invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct EnvironmentPrecheckError {
    pub violations: Vec<Violation>,
}

impl std::fmt::Display for EnvironmentPrecheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "host environment is not ready ({} violation{}): ",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// A browser session could not be opened. Fatal to the affected planned run only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to launch browser `{browser}`: {reason}")]
pub struct BrowserLaunchError {
    pub browser: String,
    pub reason: String,
}

/// An action failed against a live session. Aborts the remaining actions of the current story.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionExecutionError {
    #[error("navigation to `{url}` failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("`{kind}` action failed: {reason}")]
    Interaction { kind: &'static str, reason: String },

    #[error("action cancelled by shutdown signal")]
    Cancelled,
}

/// The probe lifecycle stage during which a [ProbeError] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Attach,
    Start,
    Stop,
    Collect,
}

impl std::fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProbeStage::Attach => "attach",
            ProbeStage::Start => "start",
            ProbeStage::Stop => "stop",
            ProbeStage::Collect => "collect",
        };
        f.write_str(name)
    }
}

/// A single probe failed during its lifecycle.
///
/// Isolated to the affected probe unless that probe is marked required, in which case the
/// runner escalates it to fail the whole planned run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("probe `{probe}` failed during {stage}: {reason}")]
pub struct ProbeError {
    pub probe: String,
    pub stage: ProbeStage,
    pub reason: String,
}

impl ProbeError {
    pub fn new(probe: impl Into<String>, stage: ProbeStage, reason: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            stage,
            reason: reason.into(),
        }
    }
}
