use crosslane_config::{BrowserConfig, Story};
use crosslane_report::RunKey;

/// One (browser, story, iteration) combination scheduled for execution.
///
/// All configured probes run together within the session of a planned run; the probe set is
/// not a plan axis.
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub key: RunKey,
    pub browser: BrowserConfig,
    pub story: Story,
}

/// Expand the configuration into the full run plan.
///
/// Iteration order is browsers in configuration order (outer), stories in configuration
/// order, then the repetition index, and the report preserves this order regardless of how
/// the runs actually complete.
pub fn build_plan(
    browsers: &[BrowserConfig],
    stories: &[Story],
    repetitions: usize,
) -> Vec<PlannedRun> {
    let mut plan = Vec::with_capacity(browsers.len() * stories.len() * repetitions);
    for browser in browsers {
        for story in stories {
            for iteration in 0..repetitions {
                plan.push(PlannedRun {
                    key: RunKey::new(&browser.name, story.name(), iteration),
                    browser: browser.clone(),
                    story: story.clone(),
                });
            }
        }
    }
    plan
}
