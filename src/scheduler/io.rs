use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::scheduler::{thread_worker::ThreadWorker, Scheduler, Task, Worker};

struct CachedPool {
    prefix: String,
    keep_alive: Duration,
    counter: AtomicUsize,
    idle: Mutex<VecDeque<(ThreadWorker, Instant)>>,
}

impl CachedPool {
    fn evict_expired(&self, idle: &mut VecDeque<(ThreadWorker, Instant)>) {
        let now = Instant::now();
        // Dropping an evicted worker closes its queue and ends the thread.
        idle.retain(|(worker, since)| {
            let keep = now.duration_since(*since) < self.keep_alive;
            if !keep {
                tracing::debug!(thread = worker.name(), "evicting idle io thread");
            }
            keep
        });
    }

    fn release(&self, worker: ThreadWorker) {
        tracing::trace!(thread = worker.name(), "io thread returned to the pool");
        let mut idle = self.idle.lock();
        self.evict_expired(&mut idle);
        idle.push_back((worker, Instant::now()));
    }
}

struct PooledWorker {
    worker: Option<ThreadWorker>,
    pool: Arc<CachedPool>,
}

impl Worker for PooledWorker {
    fn schedule(&self, task: Task) {
        if let Some(worker) = &self.worker {
            worker.schedule(task);
        }
    }
}

impl Drop for PooledWorker {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.pool.release(worker);
        }
    }
}

/// Unbounded pool for blocking work. Released threads are cached and reused by
/// later workers until they have been idle for longer than the keep-alive.
///
/// Eviction is lazy. Expired threads are dropped whenever a worker is created
/// or released; there is no background reaper.
pub struct IoScheduler {
    pool: Arc<CachedPool>,
}

impl IoScheduler {
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        IoScheduler {
            pool: Arc::new(CachedPool {
                prefix: config.thread_name_prefix.clone(),
                keep_alive: config.io_keep_alive,
                counter: AtomicUsize::new(0),
                idle: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Number of cached threads waiting for a new worker.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.pool.idle.lock().len()
    }
}

impl Scheduler for IoScheduler {
    fn name(&self) -> &str {
        "io"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        let cached = {
            let mut idle = self.pool.idle.lock();
            self.pool.evict_expired(&mut idle);
            idle.pop_back().map(|(worker, _)| worker)
        };

        let worker = match cached {
            Some(worker) => worker,
            None => {
                let n = self.pool.counter.fetch_add(1, Ordering::Relaxed) + 1;
                ThreadWorker::spawn(format!("{}CachedThreadScheduler-{n}", self.pool.prefix))?
            }
        };

        Ok(Arc::new(PooledWorker {
            worker: Some(worker),
            pool: Arc::clone(&self.pool),
        }))
    }
}
