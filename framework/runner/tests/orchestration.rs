use std::time::Duration;

use crosslane_config::{load_benchmark_config, load_stories, ActionKind, BenchmarkConfig, Story};
use crosslane_core::prelude::ShutdownHandle;
use crosslane_report::{Fatal, ProbeStatus, RunStatus};
use crosslane_runner::prelude::{run, HostState, RunnerConfig};
use crosslane_session::scripted::{ScriptedBrowserProvider, SessionEvent};
use pretty_assertions::assert_eq;

const BENCHMARK: &str = r#"
browsers:
  chrome-stable:
    path: /usr/bin/google-chrome
    flags:
      - --no-first-run
  firefox:
    path: /usr/bin/firefox
probes:
  v8.log: {}
"#;

const STORIES: &str = r#"
pages:
  Google:
    - {action: get, url: "https://www.google.com"}
    - {action: wait, duration: 10ms}
    - {action: scroll, direction: down, duration: 10ms}
  News:
    - {action: get, url: "https://news.example.com"}
    - {action: wait, duration: 10ms}
"#;

/// A host that satisfies any reasonable policy.
struct HealthyHost;

impl HostState for HealthyHost {
    fn free_disk_space_gib(&self) -> f64 {
        100.0
    }
    fn battery_powered(&self) -> bool {
        false
    }
    fn cpu_usage_percent(&self) -> f64 {
        5.0
    }
    fn relative_cpu_speed(&self) -> f64 {
        1.0
    }
    fn screen_brightness_percent(&self) -> Option<u8> {
        Some(80)
    }
    fn autobrightness_enabled(&self) -> Option<bool> {
        Some(false)
    }
    fn process_names(&self) -> Vec<String> {
        vec!["systemd".to_string()]
    }
    fn has_display(&self) -> bool {
        true
    }
}

fn benchmark() -> BenchmarkConfig {
    load_benchmark_config(BENCHMARK).unwrap()
}

fn stories() -> Vec<Story> {
    load_stories(STORIES).unwrap()
}

fn run_with(
    benchmark: &BenchmarkConfig,
    stories: &[Story],
    provider: &ScriptedBrowserProvider,
    config: &RunnerConfig,
) -> crosslane_report::Report {
    run(
        benchmark,
        stories,
        provider,
        &HealthyHost,
        config,
        ShutdownHandle::new(),
    )
    .unwrap()
}

#[test]
fn single_run_executes_actions_and_collects_probes() {
    let mut benchmark = benchmark();
    benchmark.select_browsers(&["chrome-stable".to_string()]).unwrap();
    let stories = load_stories(
        r#"
pages:
  Google:
    - {action: get, url: "https://www.google.com"}
    - {action: wait, duration: 10ms}
    - {action: scroll, direction: down, duration: 10ms}
"#,
    )
    .unwrap();
    let provider = ScriptedBrowserProvider::new();

    let report = run_with(&benchmark, &stories, &provider, &RunnerConfig::default());

    assert!(report.is_success());
    assert_eq!(report.results.len(), 1);

    let result = &report.results[0];
    assert_eq!(result.status, RunStatus::Succeeded);
    let kinds: Vec<ActionKind> = result.actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Get, ActionKind::Wait, ActionKind::Scroll]);

    assert_eq!(result.probes.len(), 1);
    assert_eq!(result.probes[0].probe, "v8.log");
    assert_eq!(result.probes[0].status, ProbeStatus::Ok);
    assert_eq!(result.probes[0].key, result.key);

    // The session was opened, driven and closed exactly once.
    assert_eq!(provider.sessions_opened(), 1);
    let events = provider.events();
    assert!(matches!(events.last(), Some(SessionEvent::Closed { .. })));
}

#[test]
fn report_covers_the_full_cross_product_in_canonical_order() {
    let provider = ScriptedBrowserProvider::new();
    let report = run_with(&benchmark(), &stories(), &provider, &RunnerConfig::default());

    assert!(report.is_success());
    let keys: Vec<(String, String)> = report
        .results
        .iter()
        .map(|r| (r.key.browser.clone(), r.key.story.clone()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("chrome-stable".to_string(), "Google".to_string()),
            ("chrome-stable".to_string(), "News".to_string()),
            ("firefox".to_string(), "Google".to_string()),
            ("firefox".to_string(), "News".to_string()),
        ]
    );
    assert_eq!(provider.sessions_opened(), 4);
}

#[test]
fn violated_environment_policy_opens_no_sessions() {
    let mut benchmark = benchmark();
    benchmark.probes.clear();
    benchmark.env.require_probes = Some(true);
    let provider = ScriptedBrowserProvider::new();

    let report = run_with(&benchmark, &stories(), &provider, &RunnerConfig::default());

    assert!(!report.is_success());
    assert!(report.results.is_empty());
    assert_eq!(provider.sessions_opened(), 0);
    match &report.fatal {
        Some(Fatal::EnvironmentPrecheck { violations }) => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].contains("require_probes"));
        }
        other => panic!("expected a precheck fatal, got {other:?}"),
    }
}

#[test]
fn unknown_probe_is_fatal_before_any_session_opens() {
    let mut benchmark = benchmark();
    benchmark.probes[0].name = "quantum.flux".to_string();
    let provider = ScriptedBrowserProvider::new();

    let report = run_with(&benchmark, &stories(), &provider, &RunnerConfig::default());

    assert!(report.results.is_empty());
    assert_eq!(provider.sessions_opened(), 0);
    match &report.fatal {
        Some(Fatal::Config { message }) => assert!(message.contains("quantum.flux")),
        other => panic!("expected a config fatal, got {other:?}"),
    }
}

#[test]
fn launch_failure_is_contained_to_the_affected_runs() {
    let provider = ScriptedBrowserProvider::new();
    provider.refuse_launch("chrome-stable");

    let report = run_with(&benchmark(), &stories(), &provider, &RunnerConfig::default());

    // Both chrome runs failed, both firefox runs still executed.
    assert!(report.complete);
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.failed_runs().count(), 2);
    for result in &report.results {
        let expect_failure = result.key.browser == "chrome-stable";
        assert_eq!(!result.succeeded(), expect_failure, "run {}", result.key);
    }
    assert_eq!(provider.sessions_opened(), 2);
}

#[test]
fn fail_fast_truncates_the_plan_after_the_first_failure() {
    let provider = ScriptedBrowserProvider::new();
    provider.refuse_launch("chrome-stable");

    let config = RunnerConfig {
        fail_fast: true,
        ..RunnerConfig::default()
    };
    let report = run_with(&benchmark(), &stories(), &provider, &config);

    assert!(!report.complete);
    assert!(!report.is_success());
    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].succeeded());
}

#[test]
fn failed_story_still_closes_the_session_and_collects_probes() {
    let mut benchmark = benchmark();
    benchmark.select_browsers(&["chrome-stable".to_string()]).unwrap();
    let provider = ScriptedBrowserProvider::new();
    provider.fail_navigation_containing("news.example.com");

    let report = run_with(&benchmark, &stories(), &provider, &RunnerConfig::default());

    assert!(report.complete);
    assert_eq!(report.results.len(), 2);

    let failed = &report.results[1];
    assert_eq!(failed.key.story, "News");
    assert!(matches!(failed.status, RunStatus::Failed { .. }));
    // The partial action log stops at the failed navigation.
    assert_eq!(failed.actions.len(), 1);
    // Probes were still finished for the failed run.
    assert_eq!(failed.probes.len(), 1);

    let closes = provider
        .events()
        .iter()
        .filter(|event| matches!(event, SessionEvent::Closed { .. }))
        .count();
    assert_eq!(closes, 2);
}

#[test]
fn repetitions_run_each_pair_multiple_times() {
    let mut benchmark = benchmark();
    benchmark.select_browsers(&["firefox".to_string()]).unwrap();
    let provider = ScriptedBrowserProvider::new();

    let config = RunnerConfig {
        repetitions: 3,
        ..RunnerConfig::default()
    };
    let report = run_with(&benchmark, &stories(), &provider, &config);

    assert!(report.is_success());
    assert_eq!(report.results.len(), 6);
    let google_iterations: Vec<usize> = report
        .results
        .iter()
        .filter(|r| r.key.story == "Google")
        .map(|r| r.key.iteration)
        .collect();
    assert_eq!(google_iterations, vec![0, 1, 2]);
}

#[test]
fn bounded_parallelism_preserves_canonical_report_order() {
    let provider = ScriptedBrowserProvider::new();
    let config = RunnerConfig {
        max_parallel: 3,
        ..RunnerConfig::default()
    };

    let report = run_with(&benchmark(), &stories(), &provider, &config);

    assert!(report.is_success());
    let sequential_provider = ScriptedBrowserProvider::new();
    let sequential =
        run_with(&benchmark(), &stories(), &sequential_provider, &RunnerConfig::default());
    let parallel_keys: Vec<_> = report.results.iter().map(|r| r.key.clone()).collect();
    let sequential_keys: Vec<_> = sequential.results.iter().map(|r| r.key.clone()).collect();
    assert_eq!(parallel_keys, sequential_keys);
}

#[test]
fn shutdown_mid_run_fails_the_run_and_marks_the_report_incomplete() {
    let mut benchmark = benchmark();
    benchmark.select_browsers(&["chrome-stable".to_string()]).unwrap();
    let stories = load_stories(
        r#"
pages:
  Slow:
    - {action: wait, duration: 60s}
  Never:
    - {action: wait, duration: 10ms}
"#,
    )
    .unwrap();
    let provider = ScriptedBrowserProvider::new();
    let shutdown = ShutdownHandle::new();

    let stopper = std::thread::spawn({
        let shutdown = shutdown.clone();
        move || {
            std::thread::sleep(Duration::from_millis(200));
            shutdown.shutdown();
        }
    });

    let report = run(
        &benchmark,
        &stories,
        &provider,
        &HealthyHost,
        &RunnerConfig::default(),
        shutdown,
    )
    .unwrap();
    stopper.join().unwrap();

    assert!(!report.complete);
    assert!(!report.is_success());
    // The interrupted run is recorded as failed, the following run never started.
    assert_eq!(report.results.len(), 1);
    assert!(matches!(report.results[0].status, RunStatus::Failed { .. }));
    assert_eq!(provider.sessions_opened(), 1);
}
