use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::scheduler::{thread_worker::ThreadWorker, Scheduler, Worker};

/// Fixed-size pool for CPU-bound work. Workers are handed out round-robin, so
/// several subscriptions may share a thread once the pool is exhausted.
pub struct ComputationScheduler {
    prefix: String,
    slots: Mutex<Vec<Option<Arc<ThreadWorker>>>>,
    next: AtomicUsize,
}

impl ComputationScheduler {
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        ComputationScheduler {
            prefix: config.thread_name_prefix.clone(),
            slots: Mutex::new(vec![None; config.computation_threads.max(1)]),
            next: AtomicUsize::new(0),
        }
    }

    /// Number of threads the pool may start.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.lock().len()
    }
}

impl Scheduler for ComputationScheduler {
    fn name(&self) -> &str {
        "computation"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        let mut slots = self.slots.lock();
        let i = self.next.fetch_add(1, Ordering::Relaxed) % slots.len();

        if let Some(worker) = &slots[i] {
            return Ok(Arc::clone(worker) as Arc<dyn Worker>);
        }

        let worker = Arc::new(ThreadWorker::spawn(format!(
            "{}ComputationThreadPool-{}",
            self.prefix,
            i + 1
        ))?);
        slots[i] = Some(Arc::clone(&worker));
        Ok(worker)
    }
}
