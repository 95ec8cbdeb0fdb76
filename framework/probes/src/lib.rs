//! The probe contract and lifecycle management.
//!
//! A probe is a pluggable instrument attached to a browser session to collect one
//! performance metric. The collected payload is probe-specific and opaque to everything in
//! this crate; the lifecycle manager only guarantees attribution and an ok/failed status.

mod set;
mod system_stats;
mod v8_log;

use crosslane_config::{Flag, ProbeConfig};
use crosslane_core::prelude::{ConfigError, Executor, ProbeError};
use crosslane_report::RunKey;
use crosslane_session::BrowserSession;

pub use set::{AttachedProbes, ProbeSet};
pub use system_stats::SystemStatsProbe;
pub use v8_log::V8LogProbe;

/// A configured probe type, ready to be attached to browser sessions.
///
/// One probe instance serves every planned run; `attach` produces a fresh [ProbeHandle] per
/// session, so implementations must not keep per-run state on the probe itself.
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a failure of this probe aborts the whole planned run instead of being
    /// isolated to this probe's result.
    fn required(&self) -> bool;

    /// Extra launch flags this probe needs on the browser command line. Queried per run,
    /// before the session is opened, since launch flags cannot change afterwards. Probes
    /// that write files should derive per-run paths from the key so repetitions and
    /// sibling runs never clobber each other.
    fn launch_flags(&self, _key: &RunKey) -> Vec<Flag> {
        Vec::new()
    }

    fn attach(
        &self,
        key: &RunKey,
        session: &mut dyn BrowserSession,
        executor: &Executor,
    ) -> Result<Box<dyn ProbeHandle>, ProbeError>;
}

/// One probe attached to one session.
///
/// `stop` must tolerate being called without a preceding successful `start`; the lifecycle
/// manager stops every attached probe on every exit path, including early failures.
pub trait ProbeHandle: Send {
    fn start(&mut self, executor: &Executor) -> Result<(), ProbeError>;

    fn stop(&mut self, executor: &Executor) -> Result<(), ProbeError>;

    fn collect(&mut self, executor: &Executor) -> Result<serde_json::Value, ProbeError>;
}

/// The probe types this build knows about, with a one line description each.
pub fn known_probes() -> Vec<(&'static str, &'static str)> {
    vec![
        (V8LogProbe::NAME, "collects a V8 engine log via --js-flags"),
        (
            SystemStatsProbe::NAME,
            "samples host CPU and memory usage at a fixed interval",
        ),
    ]
}

/// Build one probe from its configuration. An unknown probe type name is a configuration
/// error that lists the known probes.
pub fn build_probe(config: &ProbeConfig) -> Result<Box<dyn Probe>, ConfigError> {
    match config.name.as_str() {
        V8LogProbe::NAME => Ok(Box::new(V8LogProbe::from_config(config)?)),
        SystemStatsProbe::NAME => Ok(Box::new(SystemStatsProbe::from_config(config)?)),
        other => Err(ConfigError::UnknownProbe {
            name: other.to_string(),
            known: known_probes()
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
