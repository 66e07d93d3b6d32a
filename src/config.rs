//! Process-wide scheduler configuration.
//!
//! Values come from [`SchedulerConfig::default`], the environment
//! ([`SchedulerConfig::from_env`]) or explicit builder calls, and are installed
//! with `Schedulers::configure` before the first shared scheduler is used.

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;

pub const THREAD_PREFIX_VAR: &str = "RXSCHED_THREAD_PREFIX";
pub const COMPUTATION_THREADS_VAR: &str = "RXSCHED_COMPUTATION_THREADS";
pub const IO_KEEP_ALIVE_VAR: &str = "RXSCHED_IO_KEEP_ALIVE_SECS";

const DEFAULT_PREFIX: &str = "Rx";
const DEFAULT_IO_KEEP_ALIVE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("schedulers are already initialized, configure them before first use")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Prepended to every worker thread name, e.g. `RxNewThreadScheduler-1`.
    pub thread_name_prefix: String,
    /// Size of the fixed computation pool.
    pub computation_threads: usize,
    /// How long a released io thread stays cached before it is evicted.
    pub io_keep_alive: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            thread_name_prefix: DEFAULT_PREFIX.to_string(),
            computation_threads: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            io_keep_alive: DEFAULT_IO_KEEP_ALIVE,
        }
    }
}

impl SchedulerConfig {
    /// Reads overrides from the `RXSCHED_*` environment variables, falling back
    /// to the defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](SchedulerConfig::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = SchedulerConfig::default();

        if let Some(prefix) = lookup(THREAD_PREFIX_VAR) {
            config.thread_name_prefix = prefix;
        }

        if let Some(value) = lookup(COMPUTATION_THREADS_VAR) {
            config.computation_threads = value
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::Invalid {
                    key: COMPUTATION_THREADS_VAR,
                    value: value.clone(),
                })?
                .get();
        }

        if let Some(value) = lookup(IO_KEEP_ALIVE_VAR) {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    key: IO_KEEP_ALIVE_VAR,
                    value: value.clone(),
                })?;
            config.io_keep_alive = Duration::from_secs(secs);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Zero is clamped to a single thread.
    #[must_use]
    pub fn with_computation_threads(mut self, threads: usize) -> Self {
        self.computation_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_io_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.io_keep_alive = keep_alive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = SchedulerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.thread_name_prefix, "Rx");
        assert!(config.computation_threads >= 1);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = SchedulerConfig::from_lookup(lookup_from(&[
            (THREAD_PREFIX_VAR, "Demo"),
            (COMPUTATION_THREADS_VAR, " 3 "),
            (IO_KEEP_ALIVE_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.thread_name_prefix, "Demo");
        assert_eq!(config.computation_threads, 3);
        assert_eq!(config.io_keep_alive, Duration::from_secs(5));
    }

    #[test]
    fn zero_computation_threads_is_rejected() {
        let err = SchedulerConfig::from_lookup(lookup_from(&[(COMPUTATION_THREADS_VAR, "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: COMPUTATION_THREADS_VAR,
                ..
            }
        ));
    }

    #[test]
    fn malformed_keep_alive_is_rejected() {
        let err =
            SchedulerConfig::from_lookup(lookup_from(&[(IO_KEEP_ALIVE_VAR, "soon")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("invalid value `soon` for {IO_KEEP_ALIVE_VAR}")
        );
    }

    #[test]
    fn builder_clamps_thread_count() {
        let config = SchedulerConfig::default().with_computation_threads(0);
        assert_eq!(config.computation_threads, 1);
    }
}
