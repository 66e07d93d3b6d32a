use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::scheduler::{thread_worker::ThreadWorker, Scheduler, Worker};

/// Runs every worker on one shared, lazily started thread.
pub struct SingleScheduler {
    prefix: String,
    worker: Mutex<Option<Arc<ThreadWorker>>>,
}

impl SingleScheduler {
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        SingleScheduler {
            prefix: config.thread_name_prefix.clone(),
            worker: Mutex::new(None),
        }
    }
}

impl Scheduler for SingleScheduler {
    fn name(&self) -> &str {
        "single"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        let mut slot = self.worker.lock();
        if let Some(worker) = slot.as_ref() {
            return Ok(Arc::clone(worker) as Arc<dyn Worker>);
        }

        let worker = Arc::new(ThreadWorker::spawn(format!(
            "{}SingleScheduler-1",
            self.prefix
        ))?);
        *slot = Some(Arc::clone(&worker));
        Ok(worker)
    }
}
