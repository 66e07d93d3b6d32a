//! The `scheduler` module decides which thread runs a piece of reactive work.
//!
//! A [`Scheduler`] hands out [`Worker`]s. Each worker is a serial lane: tasks
//! scheduled on the same worker never overlap and run in submission order. The
//! `subscribe_on` and `observe_on` operators use one worker per subscription.
//!
//! The [`Schedulers`] facade gives access to the shared instances:
//!
//! | scheduler       | threads                                           |
//! |-----------------|---------------------------------------------------|
//! | `new_thread()`  | a fresh `RxNewThreadScheduler-N` per worker       |
//! | `single()`      | one `RxSingleScheduler-1` thread for everything   |
//! | `computation()` | fixed pool of `RxComputationThreadPool-N` threads |
//! | `io()`          | cached, growing pool of `RxCachedThreadScheduler-N` |
//! | `trampoline()`  | the current thread, re-entrant work is queued     |
//! | `from_tokio()`  | blocking tasks on a Tokio runtime                 |

mod computation;
mod io;
mod new_thread;
mod single;
mod thread_worker;
mod tokio_runtime;
mod trampoline;

pub use self::computation::ComputationScheduler;
pub use self::io::IoScheduler;
pub use self::new_thread::NewThreadScheduler;
pub use self::single::SingleScheduler;
pub use self::tokio_runtime::TokioScheduler;
pub use self::trampoline::TrampolineScheduler;

use std::sync::{Arc, OnceLock};

use crate::config::{ConfigError, SchedulerConfig};
use crate::errors::SchedulerError;

/// Unit of work executed by a [`Worker`].
pub type Task = Box<dyn FnOnce() + Send>;

/// Shared handle to a scheduler, as accepted by the scheduling operators.
pub type SchedulerRef = Arc<dyn Scheduler>;

/// Serial execution lane obtained from a [`Scheduler`].
pub trait Worker: Send + Sync {
    /// Queues `task` behind every task previously scheduled on this worker.
    fn schedule(&self, task: Task);
}

pub trait Scheduler: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns a worker for one subscription.
    ///
    /// # Errors
    ///
    /// Fails when the backing thread or runtime is unavailable.
    fn create_worker(&self) -> Result<Arc<dyn Worker>, SchedulerError>;
}

static CONFIG: OnceLock<SchedulerConfig> = OnceLock::new();
static NEW_THREAD: OnceLock<SchedulerRef> = OnceLock::new();
static SINGLE: OnceLock<SchedulerRef> = OnceLock::new();
static COMPUTATION: OnceLock<SchedulerRef> = OnceLock::new();
static IO: OnceLock<SchedulerRef> = OnceLock::new();

fn config() -> &'static SchedulerConfig {
    CONFIG.get_or_init(|| {
        SchedulerConfig::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid scheduler configuration, using defaults");
            SchedulerConfig::default()
        })
    })
}

/// Access point for the shared scheduler instances.
pub struct Schedulers;

impl Schedulers {
    /// Installs the configuration used by the shared schedulers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyInitialized`] if a configuration was already
    /// installed or a shared scheduler was already used.
    pub fn configure(config: SchedulerConfig) -> Result<(), ConfigError> {
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Returns the configuration in effect for the shared schedulers.
    pub fn config() -> &'static SchedulerConfig {
        config()
    }

    pub fn new_thread() -> SchedulerRef {
        Arc::clone(NEW_THREAD.get_or_init(|| Arc::new(NewThreadScheduler::new(config()))))
    }

    pub fn single() -> SchedulerRef {
        Arc::clone(SINGLE.get_or_init(|| Arc::new(SingleScheduler::new(config()))))
    }

    pub fn computation() -> SchedulerRef {
        Arc::clone(COMPUTATION.get_or_init(|| Arc::new(ComputationScheduler::new(config()))))
    }

    pub fn io() -> SchedulerRef {
        Arc::clone(IO.get_or_init(|| Arc::new(IoScheduler::new(config()))))
    }

    pub fn trampoline() -> SchedulerRef {
        Arc::new(TrampolineScheduler)
    }

    pub fn from_tokio(handle: tokio::runtime::Handle) -> SchedulerRef {
        Arc::new(TokioScheduler::new(handle))
    }

    /// Scheduler running on the Tokio runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] outside of a Tokio runtime.
    pub fn tokio_current() -> Result<SchedulerRef, SchedulerError> {
        Ok(Arc::new(TokioScheduler::current()?))
    }
}

/// Name of the calling thread, or its id for unnamed threads.
#[must_use]
pub fn current_thread_name() -> String {
    let current = std::thread::current();
    current
        .name()
        .map_or_else(|| format!("{:?}", current.id()), str::to_owned)
}
