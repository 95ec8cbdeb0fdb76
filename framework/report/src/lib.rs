mod aggregator;
mod model;
mod summary;

pub use aggregator::{AggregationError, ResultAggregator};
pub use model::{
    ActionOutcome, ActionRecord, Fatal, ProbeResult, ProbeStatus, Report, RunKey, RunResult,
    RunStatus,
};
