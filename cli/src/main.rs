use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use crosslane_config::{
    load_benchmark_config, load_stories, select_stories, BenchmarkConfig, ProbeConfig, Story,
};
use crosslane_core::prelude::ShutdownHandle;
use crosslane_probes::known_probes;
use crosslane_report::Fatal;
use crosslane_runner::prelude::{run, RunnerConfig, SysinfoHost};
use crosslane_session::ProcessBrowserProvider;

/// Exit code for a failed environment precheck, distinct from ordinary run failures so that
/// CI wrappers can tell a misconfigured machine from a misbehaving browser.
const EXIT_PRECHECK_FAILED: u8 = 127;

#[derive(Parser)]
#[command(name = "crosslane", about = "Cross-browser benchmark orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a benchmark: drive every configured browser through every story
    Run(RunArgs),
    /// List the probe types this build supports
    Describe,
}

#[derive(Args)]
struct RunArgs {
    /// Path to the benchmark document with `browsers`, `env` and `probes` sections
    benchmark: PathBuf,

    /// Path to the story document with the `pages` mapping
    #[clap(long)]
    stories: PathBuf,

    /// Run only this browser from the benchmark document. Can be given multiple times.
    #[clap(long)]
    browser: Vec<String>,

    /// Take the `browsers` section from this document instead of the benchmark document
    #[clap(long)]
    browser_config: Option<PathBuf>,

    /// Attach this probe with default parameters, in addition to the configured ones.
    /// Can be given multiple times.
    #[clap(long)]
    probe: Vec<String>,

    /// Take the `probes` section from this document instead of the benchmark document
    #[clap(long)]
    probe_config: Option<PathBuf>,

    /// Run only this story from the story document. Can be given multiple times.
    #[clap(long)]
    story: Vec<String>,

    /// Upper bound on planned runs executing concurrently
    #[clap(long, default_value = "1")]
    max_parallel: usize,

    /// How many times to run each browser/story pair
    #[clap(long, default_value = "1")]
    repeat: usize,

    /// Stop scheduling new runs after the first failed one
    #[clap(long, default_value = "false")]
    fail_fast: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// Recommended for CI/CD environments where the progress bar isn't being looked at by
    /// anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    no_progress: bool,

    /// Write the full report as JSON to this file
    #[clap(long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    match Cli::parse().command {
        Command::Describe => {
            describe();
            ExitCode::SUCCESS
        }
        Command::Run(args) => match execute(args) {
            Ok(code) => code,
            Err(error) => {
                eprintln!("Error: {error:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn describe() {
    println!("Known probes:");
    for (name, description) in known_probes() {
        println!("  {name:<14} {description}");
    }
}

fn execute(args: RunArgs) -> anyhow::Result<ExitCode> {
    let benchmark = assemble_benchmark(&args)?;
    let stories = assemble_stories(&args)?;

    anyhow::ensure!(
        !benchmark.browsers.is_empty(),
        "no browsers configured, nothing to benchmark"
    );
    anyhow::ensure!(!stories.is_empty(), "no stories selected, nothing to run");

    // Keep a runtime alive for the Ctrl-C watcher for the whole invocation.
    let signal_runtime = tokio::runtime::Runtime::new()?;
    let shutdown = start_shutdown_listener(&signal_runtime);

    let config = RunnerConfig {
        max_parallel: args.max_parallel,
        fail_fast: args.fail_fast,
        repetitions: args.repeat,
        no_progress: args.no_progress,
    };

    let report = run(
        &benchmark,
        &stories,
        &ProcessBrowserProvider,
        &SysinfoHost::new(),
        &config,
        shutdown,
    )?;

    println!("{}", report.summary_table());
    if !report.complete {
        println!("Note: the plan was not fully executed.");
    }

    if let Some(out) = &args.out {
        let file = File::create(out)
            .with_context(|| format!("failed to create report file {}", out.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
        log::info!("Wrote report to {}", out.display());
    }

    Ok(match &report.fatal {
        Some(Fatal::EnvironmentPrecheck { violations }) => {
            for violation in violations {
                eprintln!("Precheck violation: {violation}");
            }
            ExitCode::from(EXIT_PRECHECK_FAILED)
        }
        Some(Fatal::Config { message }) => {
            eprintln!("Configuration error: {message}");
            ExitCode::FAILURE
        }
        None if report.is_success() => ExitCode::SUCCESS,
        None => {
            for failed in report.failed_runs() {
                eprintln!("Run {} failed", failed.key);
            }
            ExitCode::FAILURE
        }
    })
}

fn assemble_benchmark(args: &RunArgs) -> anyhow::Result<BenchmarkConfig> {
    let mut benchmark = load_document(&args.benchmark)?;

    if let Some(path) = &args.browser_config {
        benchmark.browsers = load_document(path)?.browsers;
    }
    if let Some(path) = &args.probe_config {
        benchmark.probes = load_document(path)?.probes;
    }

    benchmark.select_browsers(&args.browser)?;

    for name in &args.probe {
        if !benchmark.probes.iter().any(|probe| probe.name == *name) {
            benchmark.probes.push(ProbeConfig::by_name(name));
        }
    }

    Ok(benchmark)
}

fn assemble_stories(args: &RunArgs) -> anyhow::Result<Vec<Story>> {
    let text = std::fs::read_to_string(&args.stories)
        .with_context(|| format!("failed to read story document {}", args.stories.display()))?;
    let stories = load_stories(&text)?;
    Ok(select_stories(stories, &args.story)?)
}

fn load_document(path: &Path) -> anyhow::Result<BenchmarkConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration document {}", path.display()))?;
    Ok(load_benchmark_config(&text)?)
}

fn start_shutdown_listener(runtime: &tokio::runtime::Runtime) -> ShutdownHandle {
    let handle = ShutdownHandle::new();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to receive Ctrl-C signal");
        listener_handle.shutdown();
        println!("Received shutdown signal, shutting down...");
    });

    handle
}
