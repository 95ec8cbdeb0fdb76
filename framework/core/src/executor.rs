use std::future::Future;

use crate::shutdown::{ShutdownHandle, ShutdownSignalError};

/// Bridges the synchronous orchestration loop to async work.
///
/// The orchestrator drives planned runs from plain threads, but timed suspensions and probe
/// sampling tasks are async. The executor owns the Tokio runtime for those and ties every
/// submitted future to the shutdown signal.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// The future is raced against the shutdown signal; if the orchestrator is asked to stop
    /// then this returns a [ShutdownSignalError] instead of waiting for the future.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = T>,
    ) -> Result<T, ShutdownSignalError> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => Ok(result),
                _ = shutdown_listener.wait_for_shutdown() => Err(ShutdownSignalError),
            }
        })
    }

    /// Block on async code unconditionally, ignoring the shutdown signal.
    ///
    /// Used to join supervised tasks during teardown, where the work must complete even when
    /// the run is being cancelled.
    pub fn block_on<T>(&self, fut: impl Future<Output = T>) -> T {
        self.runtime.block_on(fut)
    }

    /// Submit async code to run in the background, returning its join handle.
    ///
    /// The caller is responsible for joining (or aborting) the task; the executor never
    /// detaches work silently.
    pub fn spawn<T: Send + 'static>(
        &self,
        fut: impl Future<Output = T> + Send + 'static,
    ) -> tokio::task::JoinHandle<T> {
        self.runtime.spawn(fut)
    }
}
