use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crosslane_config::ProbeConfig;
use crosslane_core::prelude::{
    parse_duration, ConfigError, Executor, ProbeError, ProbeStage, ShutdownHandle,
};
use crosslane_report::RunKey;
use crosslane_session::BrowserSession;
use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::System;

use crate::{Probe, ProbeHandle};

/// Samples host CPU and memory usage at a fixed interval while the story plays.
///
/// Sampling runs as a supervised task owned by the probe handle: `start` spawns it, `stop`
/// signals it and joins it, so the task can never outlive the session it belongs to.
pub struct SystemStatsProbe {
    required: bool,
    interval: Duration,
}

impl SystemStatsProbe {
    pub const NAME: &'static str = "system.stats";

    pub fn from_config(config: &ProbeConfig) -> Result<Self, ConfigError> {
        let mut interval = Duration::from_secs(1);

        for (param, value) in &config.params {
            match param.as_str() {
                "interval" => {
                    let text = value.as_str().ok_or_else(|| ConfigError::InvalidProbeParam {
                        probe: Self::NAME.to_string(),
                        param: param.to_string(),
                        reason: format!("expected a duration string, got {value}"),
                    })?;
                    interval = parse_duration(text)?;
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

        // sysinfo cannot produce meaningful CPU deltas faster than this.
        let interval = interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        Ok(Self {
            required: config.required,
            interval,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct Sample {
    at: DateTime<Utc>,
    cpu_percent: f32,
    memory_used_bytes: u64,
}

impl Probe for SystemStatsProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required(&self) -> bool {
        self.required
    }

    fn attach(
        &self,
        _key: &RunKey,
        _session: &mut dyn BrowserSession,
        _executor: &Executor,
    ) -> Result<Box<dyn ProbeHandle>, ProbeError> {
        Ok(Box::new(SystemStatsHandle {
            interval: self.interval,
            samples: Arc::new(Mutex::new(Vec::new())),
            stop: ShutdownHandle::new(),
            task: None,
        }))
    }
}

struct SystemStatsHandle {
    interval: Duration,
    samples: Arc<Mutex<Vec<Sample>>>,
    stop: ShutdownHandle,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ProbeHandle for SystemStatsHandle {
    fn start(&mut self, executor: &Executor) -> Result<(), ProbeError> {
        let interval = self.interval;
        let samples = self.samples.clone();
        let mut stop = self.stop.new_listener();

        self.task = Some(executor.spawn(async move {
            let mut system = System::new();
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        system.refresh_cpu_usage();
                        system.refresh_memory();
                        samples.lock().push(Sample {
                            at: Utc::now(),
                            cpu_percent: system.global_cpu_usage(),
                            memory_used_bytes: system.used_memory(),
                        });
                    }
                    _ = stop.wait_for_shutdown() => break,
                }
            }
        }));

        Ok(())
    }

    fn stop(&mut self, executor: &Executor) -> Result<(), ProbeError> {
        let Some(task) = self.task.take() else {
            // Never started, nothing to join.
            return Ok(());
        };
        self.stop.shutdown();
        executor.block_on(task).map_err(|e| {
            ProbeError::new(
                SystemStatsProbe::NAME,
                ProbeStage::Stop,
                format!("failed to join sampling task: {e}"),
            )
        })
    }

    fn collect(&mut self, _executor: &Executor) -> Result<serde_json::Value, ProbeError> {
        let samples = self.samples.lock();
        Ok(serde_json::json!({
            "interval_ms": self.interval.as_millis() as u64,
            "samples": &*samples,
        }))
    }
}
