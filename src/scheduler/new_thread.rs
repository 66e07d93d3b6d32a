use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::scheduler::{thread_worker::ThreadWorker, Scheduler, Worker};

/// Starts a dedicated OS thread for every worker. Thread numbering is shared by
/// all workers of the scheduler and starts at 1.
pub struct NewThreadScheduler {
    prefix: String,
    counter: AtomicUsize,
}

impl NewThreadScheduler {
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        NewThreadScheduler {
            prefix: config.thread_name_prefix.clone(),
            counter: AtomicUsize::new(0),
        }
    }
}

impl Scheduler for NewThreadScheduler {
    fn name(&self) -> &str {
        "new_thread"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let worker = ThreadWorker::spawn(format!("{}NewThreadScheduler-{n}", self.prefix))?;
        Ok(Arc::new(worker))
    }
}
