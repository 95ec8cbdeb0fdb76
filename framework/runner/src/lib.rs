mod actions;
mod host;
mod plan;
mod precheck;
mod progress;
mod run;

pub mod prelude {
    pub use crate::actions::{play, PlayOutcome};
    pub use crate::host::{HostState, SysinfoHost};
    pub use crate::plan::{build_plan, PlannedRun};
    pub use crate::precheck::validate;
    pub use crate::run::{run, RunnerConfig};
}
