use crosslane_config::{Flag, ProbeConfig};
use crosslane_core::prelude::{ConfigError, Executor, ProbeError};
use crosslane_report::{ProbeResult, ProbeStatus, RunKey};
use crosslane_session::BrowserSession;

use crate::{build_probe, Probe, ProbeHandle};

/// All probes configured for a benchmark, attached together to each session.
pub struct ProbeSet {
    probes: Vec<Box<dyn Probe>>,
}

impl ProbeSet {
    pub fn from_configs(configs: &[ProbeConfig]) -> Result<Self, ConfigError> {
        let probes = configs
            .iter()
            .map(build_probe)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { probes })
    }

    /// Directly assemble a set from probe instances. Mostly useful for tests and for
    /// embedders that bring their own probe implementations.
    pub fn from_probes(probes: Vec<Box<dyn Probe>>) -> Self {
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// The launch flags every configured probe wants on the browser command line for this
    /// run, in probe configuration order.
    pub fn launch_flags(&self, key: &RunKey) -> Vec<Flag> {
        self.probes.iter().flat_map(|probe| probe.launch_flags(key)).collect()
    }

    /// Attach every probe to the session. Attach failures are recorded per probe and never
    /// prevent the remaining probes from attaching.
    pub fn attach_all(
        &self,
        key: &RunKey,
        session: &mut dyn BrowserSession,
        executor: &Executor,
    ) -> AttachedProbes {
        let entries = self
            .probes
            .iter()
            .map(|probe| {
                let mut entry = AttachedProbe {
                    name: probe.name().to_string(),
                    required: probe.required(),
                    handle: None,
                    error: None,
                    started: false,
                };
                match probe.attach(key, session, executor) {
                    Ok(handle) => entry.handle = Some(handle),
                    Err(error) => {
                        log::warn!("Probe `{}` failed to attach: {error}", entry.name);
                        entry.error = Some(error);
                    }
                }
                entry
            })
            .collect();
        AttachedProbes { entries }
    }
}

struct AttachedProbe {
    name: String,
    required: bool,
    handle: Option<Box<dyn ProbeHandle>>,
    error: Option<ProbeError>,
    started: bool,
}

impl AttachedProbe {
    fn record_error(&mut self, error: ProbeError) {
        log::warn!("Probe `{}` failed: {error}", self.name);
        // Keep the first failure, later stages usually fail as a consequence of it.
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// The per-session state of the probe lifecycle manager.
///
/// Dropping this without calling [AttachedProbes::finish] would leak started probes, so the
/// orchestrator always finishes the set on every exit path, including story failure and
/// external shutdown.
pub struct AttachedProbes {
    entries: Vec<AttachedProbe>,
}

impl AttachedProbes {
    /// Start every successfully attached probe. Failures are isolated per probe.
    pub fn start_all(&mut self, executor: &Executor) {
        for entry in &mut self.entries {
            let Some(handle) = entry.handle.as_mut() else {
                continue;
            };
            match handle.start(executor) {
                Ok(()) => entry.started = true,
                Err(error) => entry.record_error(error),
            }
        }
    }

    /// The first failure of a probe marked required, if any.
    pub fn required_failure(&self) -> Option<ProbeError> {
        self.entries
            .iter()
            .find(|entry| entry.required && entry.error.is_some())
            .and_then(|entry| entry.error.clone())
    }

    /// Names of the probes in this set marked required. Stop and collect failures only
    /// surface in the finished results, so the caller snapshots this before [Self::finish].
    pub fn required_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.required)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Stop and collect every attached probe, consuming the set.
    ///
    /// Both stop and collect are attempted for every probe that attached, even when an
    /// earlier stage already failed, so that no supervised task outlives the session.
    pub fn finish(self, key: &RunKey, executor: &Executor) -> Vec<ProbeResult> {
        self.entries
            .into_iter()
            .map(|mut entry| {
                let mut payload = serde_json::Value::Null;
                // The set is consumed here, so the handle can be moved out of its entry.
                if let Some(mut handle) = entry.handle.take() {
                    if let Err(error) = handle.stop(executor) {
                        entry.record_error(error);
                    }
                    match handle.collect(executor) {
                        Ok(collected) => payload = collected,
                        Err(error) => entry.record_error(error),
                    }
                }
                let status = match entry.error {
                    None => ProbeStatus::Ok,
                    Some(error) => ProbeStatus::Failed {
                        reason: error.to_string(),
                    },
                };
                ProbeResult {
                    probe: entry.name,
                    key: key.clone(),
                    payload,
                    status,
                }
            })
            .collect()
    }
}
