use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned from user closures passed to `create` and `defer`.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Error type delivered to observers through the `error` callback.
pub type ObserverError = Arc<dyn StdError + Send + Sync>;

/// Errors raised by the library itself and delivered through an observer's
/// `error` callback.
#[derive(Debug, Error)]
pub enum ObservableError {
    /// Plain message error, e.g. a `404` status reported by a source.
    #[error("{0}")]
    Signal(String),

    /// The scheduler could not provide a worker for the subscription.
    #[error("scheduler failed: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl ObservableError {
    /// Creates a message error ready to be passed to `Observer::error`.
    pub fn signal(message: impl Into<String>) -> ObserverError {
        Arc::new(Self::Signal(message.into()))
    }
}

/// Errors produced when a scheduler cannot create a worker.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to spawn worker thread `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("tokio scheduler requested outside of a Tokio runtime")]
    NoRuntime,
}
