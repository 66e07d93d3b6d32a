use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use crate::errors::SchedulerError;
use crate::scheduler::{Scheduler, Task, Worker};

thread_local! {
    // `Some` while a trampoline drain loop is running on this thread.
    static QUEUE: RefCell<Option<VecDeque<Task>>> = const { RefCell::new(None) };
}

/// Runs work on the calling thread. Tasks scheduled from inside a running task
/// are queued and executed after it, in order, instead of recursing.
pub struct TrampolineScheduler;

struct TrampolineWorker;

struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        QUEUE.with(|q| *q.borrow_mut() = None);
    }
}

impl Worker for TrampolineWorker {
    fn schedule(&self, task: Task) {
        let run_now = QUEUE.with(|q| {
            let mut q = q.borrow_mut();
            match q.as_mut() {
                Some(queue) => {
                    queue.push_back(task);
                    None
                }
                None => {
                    *q = Some(VecDeque::new());
                    Some(task)
                }
            }
        });

        let Some(first) = run_now else {
            return;
        };

        let _guard = DrainGuard;
        first();
        while let Some(task) = QUEUE.with(|q| q.borrow_mut().as_mut().and_then(VecDeque::pop_front)) {
            task();
        }
    }
}

impl Scheduler for TrampolineScheduler {
    fn name(&self) -> &str {
        "trampoline"
    }

    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError> {
        Ok(Arc::new(TrampolineWorker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    #[test]
    fn runs_on_calling_thread() {
        let worker = TrampolineScheduler.create_worker().unwrap();
        let caller = std::thread::current().id();
        let seen = Arc::new(Mutex::new(None));
        let seen_c = Arc::clone(&seen);

        worker.schedule(Box::new(move || {
            *seen_c.lock() = Some(std::thread::current().id());
        }));

        assert_eq!(*seen.lock(), Some(caller));
    }

    #[test]
    fn nested_tasks_run_after_current_one() {
        let worker = TrampolineScheduler.create_worker().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_outer = Arc::clone(&order);
        let inner_worker = Arc::clone(&worker);
        worker.schedule(Box::new(move || {
            order_outer.lock().push("outer start");
            for label in ["inner 1", "inner 2"] {
                let order_inner = Arc::clone(&order_outer);
                inner_worker.schedule(Box::new(move || order_inner.lock().push(label)));
            }
            order_outer.lock().push("outer end");
        }));

        assert_eq!(
            *order.lock(),
            ["outer start", "outer end", "inner 1", "inner 2"]
        );
    }
}
