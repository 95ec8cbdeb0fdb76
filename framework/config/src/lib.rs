mod action;
mod browser;
mod document;
mod env;
mod probe;
mod story;

pub use action::{Action, ActionKind, Direction};
pub use browser::{BrowserConfig, Flag};
pub use document::{load_benchmark_config, BenchmarkConfig};
pub use env::EnvironmentPolicy;
pub use probe::ProbeConfig;
pub use story::{load_stories, select_stories, Story};
