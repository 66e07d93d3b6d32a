use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::mpsc,
    thread,
};

use crate::errors::SchedulerError;
use crate::scheduler::{Task, Worker};

/// Serial worker backed by one named OS thread.
///
/// Tasks run in submission order. The thread exits once every handle to the
/// worker is dropped and the queue has drained.
pub(crate) struct ThreadWorker {
    name: String,
    tx: mpsc::Sender<Task>,
}

impl ThreadWorker {
    pub(crate) fn spawn(name: String) -> Result<Self, SchedulerError> {
        let (tx, rx) = mpsc::channel::<Task>();
        let thread_name = name.clone();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::trace!(thread = %thread_name, "worker thread started");
                while let Ok(task) = rx.recv() {
                    // A panicking callback must not take a shared pool thread down.
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::error!(thread = %thread_name, "scheduled task panicked");
                    }
                }
                tracing::trace!(thread = %thread_name, "worker thread stopped");
            })
            .map_err(|source| SchedulerError::Spawn {
                name: name.clone(),
                source,
            })?;

        tracing::debug!(thread = %name, "spawned worker thread");
        Ok(ThreadWorker { name, tx })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

impl Worker for ThreadWorker {
    fn schedule(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::warn!(thread = %self.name, "worker thread is gone, task dropped");
        }
    }
}
