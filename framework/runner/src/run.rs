use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crosslane_config::{BenchmarkConfig, Story};
use crosslane_core::prelude::{Executor, ShutdownHandle, ShutdownListener};
use crosslane_probes::ProbeSet;
use crosslane_report::{
    Fatal, ProbeResult, ProbeStatus, Report, ResultAggregator, RunResult, RunStatus,
};
use crosslane_session::BrowserProvider;
use parking_lot::Mutex;

use crate::actions::play;
use crate::host::HostState;
use crate::plan::{build_plan, PlannedRun};
use crate::precheck;
use crate::progress::RunProgress;

/// Scheduling knobs for one runner invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on planned runs executing concurrently. 1 means strictly sequential.
    pub max_parallel: usize,
    /// Stop scheduling new runs after the first failed one. The default is to keep going so
    /// one bad combination does not cost the rest of the matrix.
    pub fail_fast: bool,
    /// How many times each (browser, story) pair runs.
    pub repetitions: usize,
    /// Suppress the progress bar, e.g. for non-interactive use.
    pub no_progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            fail_fast: false,
            repetitions: 1,
            no_progress: false,
        }
    }
}

/// Execute the full benchmark: precheck the host, expand the plan, drive every planned run
/// and aggregate the results into a [Report].
///
/// The precheck runs exactly once, before any browser session opens; a violated policy
/// yields a report with zero results and a fatal error. Run failures are contained to their
/// planned run unless fail-fast is requested. An external shutdown signal stops scheduling
/// new runs and marks the report incomplete.
pub fn run(
    benchmark: &BenchmarkConfig,
    stories: &[Story],
    provider: &dyn BrowserProvider,
    host: &dyn HostState,
    config: &RunnerConfig,
    shutdown: ShutdownHandle,
) -> anyhow::Result<Report> {
    let probe_set = match ProbeSet::from_configs(&benchmark.probes) {
        Ok(set) => set,
        Err(error) => {
            log::error!("Invalid probe configuration: {error}");
            return Ok(fatal_report(error.into()));
        }
    };

    if let Err(error) = precheck::validate(&benchmark.env, host, &benchmark.browsers, probe_set.len())
    {
        log::error!("{error}");
        return Ok(fatal_report(error.into()));
    }

    let plan = build_plan(&benchmark.browsers, stories, config.repetitions);
    log::info!(
        "Planned {} runs across {} browsers and {} stories",
        plan.len(),
        benchmark.browsers.len(),
        stories.len()
    );

    let aggregator = ResultAggregator::new(plan.iter().map(|run| run.key.clone()).collect());
    let executor = Executor::new(tokio::runtime::Runtime::new()?, shutdown.clone());
    let progress = RunProgress::new(plan.len(), !config.no_progress);

    let queue: Mutex<VecDeque<PlannedRun>> = Mutex::new(plan.iter().cloned().collect());
    let stop = AtomicBool::new(false);
    let record_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);

    let workers = config.max_parallel.max(1).min(plan.len());
    std::thread::scope(|scope| {
        for index in 0..workers {
            let worker = std::thread::Builder::new().name(format!("run-worker-{index}"));
            let shutdown = shutdown.clone();
            let queue = &queue;
            let stop = &stop;
            let record_error = &record_error;
            let aggregator = &aggregator;
            let progress = &progress;
            let executor = &executor;
            let probe_set = &probe_set;
            worker
                .spawn_scoped(scope, move || {
                    let mut listener = shutdown.new_listener();
                    loop {
                        if stop.load(Ordering::SeqCst) || listener.should_shutdown() {
                            break;
                        }
                        let Some(planned) = queue.lock().pop_front() else {
                            break;
                        };

                        let result =
                            execute_planned_run(&planned, provider, probe_set, executor, &mut listener);
                        let failed = !result.succeeded();

                        if let Err(error) = aggregator.record(result) {
                            *record_error.lock() = Some(error.into());
                            stop.store(true, Ordering::SeqCst);
                            break;
                        }
                        progress.run_finished(&planned.key);

                        if failed && config.fail_fast {
                            log::warn!("Run {} failed, stopping early", planned.key);
                            stop.store(true, Ordering::SeqCst);
                        }
                    }
                })
                .expect("Failed to start run worker thread");
        }
    });
    progress.finish();

    if let Some(error) = record_error.into_inner() {
        return Err(error);
    }

    let complete = aggregator.recorded() == plan.len();
    Ok(aggregator.finalize(None, complete))
}

fn fatal_report(fatal: Fatal) -> Report {
    Report {
        results: vec![],
        fatal: Some(fatal),
        complete: false,
    }
}

/// Drive one planned run through its whole lifecycle: open the session, attach and start the
/// probes, play the story, then tear everything down in reverse order.
///
/// Teardown runs on every path. Once the session is open it is always closed, and once
/// probes attach they are always finished, whatever failed in between.
fn execute_planned_run(
    planned: &PlannedRun,
    provider: &dyn BrowserProvider,
    probe_set: &ProbeSet,
    executor: &Executor,
    listener: &mut ShutdownListener,
) -> RunResult {
    log::info!("RUN START {}", planned.key);

    // Probes that need browser flags contribute them before launch.
    let mut browser = planned.browser.clone();
    browser.flags.extend(probe_set.launch_flags(&planned.key));

    let mut session = match provider.open(&browser) {
        Ok(session) => session,
        Err(error) => {
            log::error!("RUN FAILED {}: {error}", planned.key);
            return RunResult {
                key: planned.key.clone(),
                actions: vec![],
                probes: vec![],
                status: RunStatus::Failed {
                    reason: error.to_string(),
                },
            };
        }
    };

    let mut failure: Option<String> = None;

    let mut attached = probe_set.attach_all(&planned.key, session.as_mut(), executor);
    if let Some(error) = attached.required_failure() {
        failure = Some(error.to_string());
    }

    let mut actions = vec![];
    if failure.is_none() {
        attached.start_all(executor);
        if let Some(error) = attached.required_failure() {
            failure = Some(error.to_string());
        }
    }

    if failure.is_none() {
        let outcome = play(session.as_mut(), &planned.story, executor, listener);
        actions = outcome.log;
        if let Some(error) = outcome.error {
            failure = Some(error.to_string());
        }
    }

    let required = attached.required_names();
    let probes = attached.finish(&planned.key, executor);
    if failure.is_none() {
        failure = required_probe_failure(&required, &probes);
    }

    if let Err(error) = session.close() {
        log::warn!("Failed to close session for {}: {error}", planned.key);
        if failure.is_none() {
            failure = Some(format!("failed to close browser session: {error}"));
        }
    }

    let status = match failure {
        None => {
            log::info!("RUN END {}", planned.key);
            RunStatus::Succeeded
        }
        Some(reason) => {
            log::error!("RUN FAILED {}: {reason}", planned.key);
            RunStatus::Failed { reason }
        }
    };

    RunResult {
        key: planned.key.clone(),
        actions,
        probes,
        status,
    }
}

/// Stop and collect failures only become visible in the finished probe results; a required
/// probe failing there still fails the whole run.
fn required_probe_failure(required: &[String], probes: &[ProbeResult]) -> Option<String> {
    probes
        .iter()
        .filter(|result| required.contains(&result.probe))
        .find_map(|result| match &result.status {
            ProbeStatus::Failed { reason } => {
                Some(format!("required probe `{}` failed: {reason}", result.probe))
            }
            ProbeStatus::Ok => None,
        })
}
