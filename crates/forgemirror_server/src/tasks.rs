//! Supervised background tasks.
//!
//! Everything the server runs off the request path goes through
//! [`TaskPool`]: the pending-event drain loop, delivery pruning, and the
//! re-syncs kicked off by mutation endpoints. A supervisor task logs how
//! each job ended, so a panic surfaces in the logs instead of vanishing,
//! and shutdown can wait for the loops to wind down.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawns supervised tasks and drives their shutdown.
#[derive(Clone)]
pub(crate) struct TaskPool {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    stop: watch::Sender<bool>,
}

impl TaskPool {
    pub(crate) fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            stop,
        }
    }

    /// Receiver that resolves `changed()` when shutdown starts. Long-running
    /// loops select on it next to their interval tick.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }

    /// Spawn a task under supervision.
    pub(crate) fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.to_string();
        let inner = tokio::spawn(future);
        let supervisor = tokio::spawn(async move {
            match inner.await {
                Ok(()) => tracing::debug!("task '{name}' finished"),
                Err(err) if err.is_panic() => tracing::error!("task '{name}' panicked: {err}"),
                Err(_) => tracing::debug!("task '{name}' cancelled"),
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|handle| !handle.is_finished());
        handles.push(supervisor);
    }

    /// Signal every subscriber to stop, then wait up to `grace` for the
    /// supervised tasks to finish.
    pub(crate) async fn shutdown(&self, grace: Duration) {
        let _ = self.stop.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };

        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!("background tasks did not stop within {grace:?}");
        }
    }
}
