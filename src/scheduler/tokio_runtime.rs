use std::sync::Arc;

use tokio::{runtime::Handle, sync::mpsc, task};

use crate::errors::SchedulerError;
use crate::scheduler::{Scheduler, Task, Worker};

/// Runs workers on a Tokio runtime. Each worker is a task that drains its queue
/// and hands every job to the blocking pool, one at a time, so observer
/// callbacks may block without stalling the runtime.
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] outside of a Tokio runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::NoRuntime)
    }
}

struct TokioWorker {
    tx: mpsc::UnboundedSender<Task>,
}

impl Worker for TokioWorker {
    fn schedule(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::warn!("tokio worker task is gone, task dropped");
        }
    }
}

impl Scheduler for TokioScheduler {
    fn name(&self) -> &str {
        "tokio"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();

        self.handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = task::spawn_blocking(job).await {
                    tracing::error!(error = %e, "scheduled task failed");
                }
            }
        });

        Ok(Arc::new(TokioWorker { tx }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    #[test]
    fn current_fails_outside_runtime() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(SchedulerError::NoRuntime)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tasks_keep_submission_order() {
        let worker = TokioScheduler::current().unwrap().create_worker().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        for i in 0..20 {
            let seen = Arc::clone(&seen);
            worker.schedule(Box::new(move || seen.lock().push(i)));
        }
        worker.schedule(Box::new(move || {
            let _ = done_tx.send(());
        }));

        done_rx.await.unwrap();
        assert_eq!(*seen.lock(), (0..20).collect::<Vec<_>>());
    }
}
