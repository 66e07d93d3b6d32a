use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

type Teardown = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct State {
    settled: bool,
    teardowns: Vec<Teardown>,
}

#[derive(Default)]
struct Inner {
    disposed: AtomicBool,
    state: Mutex<State>,
    settled_cv: Condvar,
}

/// Cancellation handle shared by every hop of a single subscription chain.
///
/// A chain is *settled* once its final subscriber received a terminal signal or
/// once it was disposed. Settling runs the registered teardowns exactly once and
/// wakes every thread blocked in [`wait`](Disposable::wait).
#[derive(Clone, Default)]
pub struct Disposable {
    inner: Arc<Inner>,
}

impl Disposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops delivery of further signals to the subscriber and releases the
    /// resources registered with [`add`](Disposable::add). Calling it more than
    /// once has no additional effect.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::trace!("subscription disposed");
        self.settle();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Returns `true` after a terminal signal reached the final subscriber or
    /// after the chain was disposed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.state.lock().settled
    }

    /// Registers teardown logic that runs when the chain settles. If the chain
    /// already settled the teardown runs immediately on the calling thread.
    pub fn add(&self, teardown: impl FnOnce() + Send + 'static) {
        let mut state = self.inner.state.lock();
        if state.settled {
            drop(state);
            teardown();
            return;
        }
        state.teardowns.push(Box::new(teardown));
    }

    /// Blocks the current thread until the chain settles.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        while !state.settled {
            self.inner.settled_cv.wait(&mut state);
        }
    }

    /// Blocks until the chain settles or `timeout` elapses. Returns whether the
    /// chain settled.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while !state.settled {
            if self
                .inner
                .settled_cv
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.settled;
            }
        }
        true
    }

    pub(crate) fn settle(&self) {
        let teardowns = {
            let mut state = self.inner.state.lock();
            if state.settled {
                return;
            }
            state.settled = true;
            std::mem::take(&mut state.teardowns)
        };
        self.inner.settled_cv.notify_all();

        // Teardowns may dispose this very chain again, so they run unlocked.
        for teardown in teardowns {
            teardown();
        }
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .field("settled", &self.is_settled())
            .finish()
    }
}
