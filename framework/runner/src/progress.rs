use indicatif::{ProgressBar, ProgressStyle};
use crosslane_report::RunKey;

/// Displays a progress bar over the planned runs so the user can see how far along the
/// invocation is. Disabled bars swallow all updates.
pub(crate) struct RunProgress {
    bar: Option<ProgressBar>,
}

impl RunProgress {
    pub(crate) fn new(total_runs: usize, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total_runs as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} runs {msg}",
            )
            .expect("Failed to set progress style")
            .progress_chars("#>-"),
        );
        Self { bar: Some(bar) }
    }

    pub(crate) fn run_finished(&self, key: &RunKey) {
        if let Some(bar) = &self.bar {
            bar.set_message(key.to_string());
            bar.inc(1);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
