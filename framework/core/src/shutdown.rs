use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

/// Broadcasts a stop request to every part of the orchestrator that is doing timed work.
///
/// Cloning the handle is cheap and all clones refer to the same underlying channel.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    /// Request that all listeners stop their current work.
    pub fn shutdown(&self) {
        if self.sender.send(()).is_err() {
            // Nobody is listening, which is fine if the run already finished.
            log::debug!("Shutdown requested but no listeners are registered");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener::new(self.sender.subscribe())
    }
}

/// The receiving side of a [ShutdownHandle].
///
/// Listeners are handed to planned runs, probes and background tasks so that each can react
/// to an external stop request at its own suspension points.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    receiver: Arc<Mutex<Receiver<()>>>,
    // Observing the broadcast message consumes it, so the listener remembers having seen it.
    // A listener that has once reported shutdown keeps reporting it.
    received: Arc<AtomicBool>,
}

impl ShutdownListener {
    pub(crate) fn new(receiver: Receiver<()>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            received: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Point in time check whether the shutdown signal has been received.
    pub fn should_shutdown(&mut self) -> bool {
        if self.received.load(Ordering::SeqCst) {
            return true;
        }
        let observed = match self.receiver.try_lock() {
            Ok(mut guard) => match guard.try_recv() {
                Ok(_) => true,
                Err(tokio::sync::broadcast::error::TryRecvError::Closed) => true,
                // Empty or lagged receivers have not been told to stop.
                Err(_) => false,
            },
            Err(_) => false,
        };
        if observed {
            self.received.store(true, Ordering::SeqCst);
        }
        observed
    }

    /// Wait until the shutdown signal is received.
    ///
    /// Safe to race against another future so that in-progress work can be cancelled.
    pub async fn wait_for_shutdown(&mut self) {
        if self.received.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.receiver.lock().await.recv().await;
        self.received.store(true, Ordering::SeqCst);
    }
}

/// Error used to surface a cancelled operation to the caller that submitted it.
#[derive(Debug, Clone, Error)]
#[error("execution cancelled by shutdown signal")]
pub struct ShutdownSignalError;
