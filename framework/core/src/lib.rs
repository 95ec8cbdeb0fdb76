mod duration;
mod error;
mod executor;
mod shutdown;

pub mod prelude {
    pub use crate::duration::parse_duration;
    pub use crate::error::{
        ActionExecutionError, BrowserLaunchError, ConfigError, EnvironmentPrecheckError,
        ProbeError, ProbeStage, Violation,
    };
    pub use crate::executor::Executor;
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignalError};
}
