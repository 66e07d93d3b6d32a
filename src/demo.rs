//! Two scenarios that show on which threads the parts of a scheduled
//! subscription run.
//!
//! * [`create_scenario`] emits four messages and a `404` error from
//!   `Observable::create`.
//! * [`just_scenario`] builds `Observable::just` lazily inside
//!   `Observable::defer`.
//!
//! Both subscribe on a new thread and observe on another new thread with
//! delayed errors. Every callback is logged with the name of its thread and
//! recorded in a [`DemoReport`].

use std::{fmt::Display, marker::PhantomData, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::errors::{ObservableError, ObserverError};
use crate::observer::Observer;
use crate::scheduler::{current_thread_name, Schedulers};
use crate::subscription::{subscribe::Subscriber, Disposable};
use crate::{Observable, ObservableExt, Subscribeable};

pub const CREATE_MESSAGES: [&str; 4] = ["msg1", "msg2", "msg3", "msg4"];
pub const CREATE_ERROR: &str = "404";
pub const JUST_VALUE: i32 = 123;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// The source started producing values.
    SourceStarted,
    Subscribed,
    Next,
    Error,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoEvent {
    pub callback: Callback,
    pub payload: Option<String>,
    pub thread: String,
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Upper bound for waiting on the terminal signal.
    pub wait: Duration,
    /// Dispose the subscription from inside `on_subscribe`.
    pub dispose_on_subscribe: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        DemoOptions {
            wait: Duration::from_millis(2000),
            dispose_on_subscribe: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoReport {
    pub caller_thread: String,
    pub events: Vec<DemoEvent>,
    /// `false` if the subscription did not settle within the wait limit.
    pub finished: bool,
}

impl DemoReport {
    pub fn events_of(&self, callback: Callback) -> impl Iterator<Item = &DemoEvent> {
        self.events.iter().filter(move |e| e.callback == callback)
    }

    #[must_use]
    pub fn next_payloads(&self) -> Vec<&str> {
        self.events_of(Callback::Next)
            .filter_map(|e| e.payload.as_deref())
            .collect()
    }
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<DemoEvent>>>);

impl EventLog {
    fn record(&self, callback: Callback, payload: Option<String>) {
        let thread = current_thread_name();
        tracing::info!(
            thread = %thread,
            callback = ?callback,
            payload = payload.as_deref().unwrap_or(""),
            "observable callback"
        );
        self.0.lock().push(DemoEvent {
            callback,
            payload,
            thread,
        });
    }

    fn snapshot(&self) -> Vec<DemoEvent> {
        self.0.lock().clone()
    }
}

/// Observer that logs and records every callback it receives.
struct LoggingObserver<T> {
    log: EventLog,
    dispose_on_subscribe: bool,
    _marker: PhantomData<fn(T)>,
}

impl<T> LoggingObserver<T> {
    fn new(log: EventLog, dispose_on_subscribe: bool) -> Self {
        LoggingObserver {
            log,
            dispose_on_subscribe,
            _marker: PhantomData,
        }
    }
}

impl<T: Display> Observer for LoggingObserver<T> {
    type NextFnType = T;

    fn subscribed(&mut self, disposable: &Disposable) {
        self.log.record(Callback::Subscribed, None);
        if self.dispose_on_subscribe {
            disposable.dispose();
        }
    }

    fn next(&mut self, v: T) {
        self.log.record(Callback::Next, Some(v.to_string()));
    }

    fn complete(&mut self) {
        self.log.record(Callback::Complete, None);
    }

    fn error(&mut self, e: ObserverError) {
        self.log.record(Callback::Error, Some(e.to_string()));
    }
}

fn run<T>(log: EventLog, observable: Observable<T>, options: &DemoOptions) -> DemoReport
where
    T: Display + Send + 'static,
{
    let caller_thread = current_thread_name();
    let observer = LoggingObserver::new(log.clone(), options.dispose_on_subscribe);

    let subscription = observable
        .subscribe_on(Schedulers::new_thread())
        .observe_on_delay_error(Schedulers::new_thread(), true)
        .subscribe(Subscriber::from_observer(observer));

    tracing::info!(wait = ?options.wait, "waiting for the subscription to settle");
    let finished = subscription.join_timeout(options.wait);
    if !finished {
        tracing::warn!(wait = ?options.wait, "subscription still running after the wait limit");
    }

    DemoReport {
        caller_thread,
        events: log.snapshot(),
        finished,
    }
}

/// Emits [`CREATE_MESSAGES`] followed by a [`CREATE_ERROR`] error from
/// `Observable::create`.
#[must_use]
pub fn create_scenario(options: &DemoOptions) -> DemoReport {
    let log = EventLog::default();
    let source_log = log.clone();

    let observable = Observable::create(move |emitter| {
        source_log.record(Callback::SourceStarted, Some("create".to_string()));
        for msg in CREATE_MESSAGES {
            emitter.next(msg.to_string());
        }
        emitter.error(ObservableError::signal(CREATE_ERROR));
        Ok(())
    });

    let report = run(log, observable, options);
    tracing::info!(finished = report.finished, "create scenario end");
    report
}

/// Emits [`just_value`] from `Observable::just`, created lazily by
/// `Observable::defer` on the subscribe-on thread.
#[must_use]
pub fn just_scenario(options: &DemoOptions) -> DemoReport {
    let log = EventLog::default();
    let source_log = log.clone();

    let observable = Observable::defer(move || {
        source_log.record(Callback::SourceStarted, Some("defer".to_string()));
        Ok(Observable::just([just_value()]))
    });

    let report = run(log, observable, options);
    tracing::info!(finished = report.finished, "just scenario end");
    report
}

/// Value emitted by [`just_scenario`]. It performs a checked division by zero
/// first and logs the failure instead of silently ignoring it.
#[must_use]
pub fn just_value() -> i32 {
    let divisor = 0;
    match 1_i32.checked_div(divisor) {
        Some(quotient) => tracing::debug!(quotient, "division succeeded"),
        None => tracing::warn!(divisor, "division by zero while computing the value, ignored"),
    }
    tracing::info!(thread = %current_thread_name(), value = JUST_VALUE, "just value computed");
    JUST_VALUE
}
