use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::ObserverError;
use crate::observer::Observer;
use crate::scheduler::Worker;
use crate::subscription::subscribe::Subscriber;

/// Shared state of one `observe_on` subscription.
///
/// Every upstream signal becomes a task on the same serial worker, so the
/// downstream subscriber sees them one at a time and in order.
pub(super) struct ObserveOnState<T> {
    downstream: Mutex<Subscriber<T>>,
    worker: Mutex<Option<Arc<dyn Worker>>>,
    // Error waiting to cut ahead of queued values when errors are not delayed.
    pending_error: Mutex<Option<ObserverError>>,
    delay_error: bool,
}

impl<T: Send + 'static> ObserveOnState<T> {
    pub(super) fn new(
        downstream: Subscriber<T>,
        worker: Arc<dyn Worker>,
        delay_error: bool,
    ) -> Arc<Self> {
        Arc::new(ObserveOnState {
            downstream: Mutex::new(downstream),
            worker: Mutex::new(Some(worker)),
            pending_error: Mutex::new(None),
            delay_error,
        })
    }

    fn schedule(self: &Arc<Self>, task: impl FnOnce(&Self) + Send + 'static) {
        let worker = self.worker.lock().clone();
        match worker {
            Some(worker) => {
                let state = Arc::clone(self);
                worker.schedule(Box::new(move || task(&state)));
            }
            None => tracing::trace!("observe_on worker already released, signal dropped"),
        }
    }

    pub(super) fn push_next(self: &Arc<Self>, v: T) {
        self.schedule(move |state| {
            let mut downstream = state.downstream.lock();
            let pending = state.pending_error.lock().take();
            match pending {
                Some(e) => downstream.error(e),
                None => downstream.next(v),
            }
        });
    }

    pub(super) fn push_error(self: &Arc<Self>, observable_error: ObserverError) {
        if self.delay_error {
            self.schedule(move |state| {
                state.downstream.lock().error(observable_error);
                state.release_worker();
            });
        } else {
            *self.pending_error.lock() = Some(observable_error);
            self.schedule(|state| {
                let pending = state.pending_error.lock().take();
                if let Some(e) = pending {
                    state.downstream.lock().error(e);
                }
                state.release_worker();
            });
        }
    }

    pub(super) fn push_complete(self: &Arc<Self>) {
        self.schedule(|state| {
            state.downstream.lock().complete();
            state.release_worker();
        });
    }

    /// Drops this subscription's handle on the worker. Already queued tasks
    /// still run; later signals are dropped.
    ///
    /// Runs from the terminal task once the terminal signal was delivered, or
    /// right away when the chain is disposed. Pooled threads must not go back
    /// to their pool while callbacks are still queued on them.
    pub(super) fn release_worker(&self) {
        self.worker.lock().take();
    }
}
