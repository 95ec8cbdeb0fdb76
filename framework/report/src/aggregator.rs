use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::model::{Fatal, Report, RunKey, RunResult};

/// Internal consistency failures while recording run results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("duplicate run result recorded for `{key}`, each planned run executes exactly once")]
    DuplicateKey { key: RunKey },

    #[error("run result recorded for `{key}` which is not part of the plan")]
    UnplannedKey { key: RunKey },
}

/// Collects per-run results as they complete and emits them in canonical order.
///
/// The aggregator is created from the full run plan up front so that `finalize` can order
/// results by plan position regardless of actual completion order. `record` serializes
/// concurrent callers internally, which is all the sharing bounded-concurrency mode needs.
#[derive(Debug)]
pub struct ResultAggregator {
    planned: Vec<RunKey>,
    results: Mutex<HashMap<RunKey, RunResult>>,
}

impl ResultAggregator {
    pub fn new(planned: Vec<RunKey>) -> Self {
        Self {
            results: Mutex::new(HashMap::with_capacity(planned.len())),
            planned,
        }
    }

    pub fn record(&self, result: RunResult) -> Result<(), AggregationError> {
        if !self.planned.contains(&result.key) {
            return Err(AggregationError::UnplannedKey { key: result.key });
        }
        let mut results = self.results.lock();
        if results.contains_key(&result.key) {
            return Err(AggregationError::DuplicateKey { key: result.key });
        }
        results.insert(result.key.clone(), result);
        Ok(())
    }

    /// Number of results recorded so far.
    pub fn recorded(&self) -> usize {
        self.results.lock().len()
    }

    pub fn finalize(self, fatal: Option<Fatal>, complete: bool) -> Report {
        let mut results = self.results.into_inner();
        let ordered = self
            .planned
            .iter()
            .filter_map(|key| results.remove(key))
            .collect();
        Report {
            results: ordered,
            fatal,
            complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;
    use pretty_assertions::assert_eq;

    fn result(key: RunKey) -> RunResult {
        RunResult {
            key,
            actions: vec![],
            probes: vec![],
            status: RunStatus::Succeeded,
        }
    }

    fn keys() -> Vec<RunKey> {
        vec![
            RunKey::new("chrome", "Google", 0),
            RunKey::new("chrome", "News", 0),
            RunKey::new("firefox", "Google", 0),
        ]
    }

    #[test]
    fn finalize_orders_by_plan_not_completion() {
        let aggregator = ResultAggregator::new(keys());
        aggregator.record(result(RunKey::new("firefox", "Google", 0))).unwrap();
        aggregator.record(result(RunKey::new("chrome", "News", 0))).unwrap();
        aggregator.record(result(RunKey::new("chrome", "Google", 0))).unwrap();

        let report = aggregator.finalize(None, true);
        let ordered: Vec<RunKey> = report.results.iter().map(|r| r.key.clone()).collect();
        assert_eq!(ordered, keys());
        assert!(report.is_success());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let aggregator = ResultAggregator::new(keys());
        let key = RunKey::new("chrome", "Google", 0);
        aggregator.record(result(key.clone())).unwrap();
        let err = aggregator.record(result(key.clone())).unwrap_err();
        assert_eq!(err, AggregationError::DuplicateKey { key });
    }

    #[test]
    fn unplanned_keys_are_rejected() {
        let aggregator = ResultAggregator::new(keys());
        let key = RunKey::new("safari", "Google", 0);
        let err = aggregator.record(result(key.clone())).unwrap_err();
        assert_eq!(err, AggregationError::UnplannedKey { key });
    }

    #[test]
    fn truncated_plan_yields_incomplete_report() {
        let aggregator = ResultAggregator::new(keys());
        aggregator.record(result(RunKey::new("chrome", "Google", 0))).unwrap();
        let report = aggregator.finalize(None, false);
        assert_eq!(report.results.len(), 1);
        assert!(!report.is_success());
    }
}
