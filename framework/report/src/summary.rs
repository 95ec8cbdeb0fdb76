use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::{ProbeStatus, Report, RunStatus};

#[derive(Tabled)]
struct RunRow {
    browser: String,
    story: String,
    iteration: usize,
    actions: usize,
    probes: String,
    status: String,
}

impl Report {
    /// Render the report as a human readable summary table, one row per run.
    pub fn summary_table(&self) -> String {
        let rows: Vec<RunRow> = self
            .results
            .iter()
            .map(|result| {
                let ok = result
                    .probes
                    .iter()
                    .filter(|probe| probe.status == ProbeStatus::Ok)
                    .count();
                let failed = result.probes.len() - ok;
                let probes = if failed == 0 {
                    format!("{ok} ok")
                } else {
                    format!("{ok} ok, {failed} failed")
                };
                let status = match &result.status {
                    RunStatus::Succeeded => "succeeded".to_string(),
                    RunStatus::Failed { reason } => format!("failed: {reason}"),
                };
                RunRow {
                    browser: result.key.browser.clone(),
                    story: result.key.story.clone(),
                    iteration: result.key.iteration,
                    actions: result.actions.len(),
                    probes,
                    status,
                }
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::modern());
        table.to_string()
    }
}
