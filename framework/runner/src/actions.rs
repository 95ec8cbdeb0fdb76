use std::time::Duration;

use chrono::Utc;
use crosslane_config::{Action, Story};
use crosslane_core::prelude::{ActionExecutionError, Executor, ShutdownListener};
use crosslane_report::{ActionOutcome, ActionRecord};
use crosslane_session::BrowserSession;

/// The result of playing one story: the ordered action log and, if the story aborted, the
/// failure that stopped it. Actions after a failed one are never attempted.
#[derive(Debug)]
pub struct PlayOutcome {
    pub log: Vec<ActionRecord>,
    pub error: Option<ActionExecutionError>,
}

/// Play a story against a live session, strictly in story order.
///
/// Timed suspensions are raced against the shutdown listener so an external stop aborts the
/// current action instead of sleeping it out. Execution is deterministic given the
/// session's responses: replaying the same story against an equivalent session produces the
/// same action sequence.
pub fn play(
    session: &mut dyn BrowserSession,
    story: &Story,
    executor: &Executor,
    shutdown: &mut ShutdownListener,
) -> PlayOutcome {
    let mut log = Vec::with_capacity(story.actions().len());

    for action in story.actions() {
        if shutdown.should_shutdown() {
            return PlayOutcome {
                log,
                error: Some(ActionExecutionError::Cancelled),
            };
        }

        let started = Utc::now();
        log::info!("ACTION START {} story={}", action.kind(), story.name());

        let result = match action {
            Action::Get { url } => {
                session
                    .navigate(url)
                    .map_err(|e| ActionExecutionError::Navigation {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
            }
            Action::Wait { duration } => wait(executor, shutdown, *duration),
            Action::Scroll {
                direction,
                duration,
            } => session
                .scroll(*direction, *duration)
                .map_err(|e| ActionExecutionError::Interaction {
                    kind: "scroll",
                    reason: e.to_string(),
                }),
        };

        let finished = Utc::now();
        log::info!("ACTION END {} story={}", action.kind(), story.name());

        match result {
            Ok(()) => log.push(ActionRecord {
                kind: action.kind(),
                started,
                finished,
                outcome: ActionOutcome::Ok,
            }),
            Err(error) => {
                log.push(ActionRecord {
                    kind: action.kind(),
                    started,
                    finished,
                    outcome: ActionOutcome::Failed {
                        reason: error.to_string(),
                    },
                });
                return PlayOutcome {
                    log,
                    error: Some(error),
                };
            }
        }
    }

    PlayOutcome { log, error: None }
}

fn wait(
    executor: &Executor,
    shutdown: &mut ShutdownListener,
    duration: Duration,
) -> Result<(), ActionExecutionError> {
    executor.block_on(async {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = shutdown.wait_for_shutdown() => Err(ActionExecutionError::Cancelled),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslane_config::{load_stories, ActionKind, BrowserConfig};
    use crosslane_core::prelude::ShutdownHandle;
    use crosslane_session::scripted::ScriptedBrowserProvider;
    use crosslane_session::BrowserProvider;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const STORY: &str = r#"
pages:
  Google:
    - {action: get, url: "https://www.google.com"}
    - {action: wait, duration: 10ms}
    - {action: scroll, direction: down, duration: 10ms}
"#;

    fn setup() -> (ScriptedBrowserProvider, Story, Executor) {
        let provider = ScriptedBrowserProvider::new();
        let story = load_stories(STORY).unwrap().remove(0);
        let executor = Executor::new(
            tokio::runtime::Runtime::new().unwrap(),
            ShutdownHandle::new(),
        );
        (provider, story, executor)
    }

    fn open(provider: &ScriptedBrowserProvider) -> Box<dyn BrowserSession> {
        provider
            .open(&BrowserConfig {
                name: "chrome".to_string(),
                path: PathBuf::from("/usr/bin/google-chrome"),
                flags: vec![],
            })
            .unwrap()
    }

    fn kinds(outcome: &PlayOutcome) -> Vec<ActionKind> {
        outcome.log.iter().map(|record| record.kind).collect()
    }

    #[test]
    fn plays_actions_in_story_order() {
        let (provider, story, executor) = setup();
        let shutdown = ShutdownHandle::new();
        let mut session = open(&provider);

        let outcome = play(
            session.as_mut(),
            &story,
            &executor,
            &mut shutdown.new_listener(),
        );

        assert!(outcome.error.is_none());
        assert_eq!(
            kinds(&outcome),
            vec![ActionKind::Get, ActionKind::Wait, ActionKind::Scroll]
        );
        assert!(outcome.log.iter().all(|r| r.outcome == ActionOutcome::Ok));
    }

    #[test]
    fn replaying_against_an_equivalent_session_is_deterministic() {
        let (provider, story, executor) = setup();
        let shutdown = ShutdownHandle::new();

        let mut first = open(&provider);
        let mut second = open(&provider);
        let outcome_a = play(first.as_mut(), &story, &executor, &mut shutdown.new_listener());
        let outcome_b = play(second.as_mut(), &story, &executor, &mut shutdown.new_listener());

        assert_eq!(kinds(&outcome_a), kinds(&outcome_b));
    }

    #[test]
    fn a_failed_action_aborts_the_remaining_story() {
        let (provider, story, executor) = setup();
        provider.fail_navigation_containing("google.com");
        let shutdown = ShutdownHandle::new();
        let mut session = open(&provider);

        let outcome = play(
            session.as_mut(),
            &story,
            &executor,
            &mut shutdown.new_listener(),
        );

        assert!(matches!(
            outcome.error,
            Some(ActionExecutionError::Navigation { .. })
        ));
        // Only the failed action is in the log, the wait and scroll never ran.
        assert_eq!(kinds(&outcome), vec![ActionKind::Get]);
        assert!(matches!(
            outcome.log[0].outcome,
            ActionOutcome::Failed { .. }
        ));
    }

    #[test]
    fn shutdown_aborts_a_wait_in_progress() {
        let provider = ScriptedBrowserProvider::new();
        let story = load_stories(
            r#"
pages:
  Slow:
    - {action: wait, duration: 60s}
"#,
        )
        .unwrap()
        .remove(0);
        let shutdown = ShutdownHandle::new();
        let executor = Executor::new(tokio::runtime::Runtime::new().unwrap(), shutdown.clone());
        let mut listener = shutdown.new_listener();
        let mut session = open(&provider);

        let stopper = std::thread::spawn({
            let shutdown = shutdown.clone();
            move || {
                std::thread::sleep(Duration::from_millis(50));
                shutdown.shutdown();
            }
        });

        let outcome = play(session.as_mut(), &story, &executor, &mut listener);
        stopper.join().unwrap();

        assert_eq!(outcome.error, Some(ActionExecutionError::Cancelled));
    }
}
