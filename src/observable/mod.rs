//! The `observable` module provides the building blocks for creating observables
//! and for moving their work between threads with schedulers.
//!
//! # Example: emitting on one thread, observing on another
//!
//! ```no_run
//! use rxsched::{
//!     errors::ObservableError, scheduler::Schedulers, subscribe::Subscriber, Observable,
//!     ObservableExt, Observer, Subscribeable,
//! };
//!
//! let mut observable = Observable::create(|emitter| {
//!     emitter.next("msg1");
//!     emitter.next("msg2");
//!     emitter.error(ObservableError::signal("404"));
//!     Ok(())
//! })
//! .subscribe_on(Schedulers::new_thread())
//! .observe_on_delay_error(Schedulers::new_thread(), true);
//!
//! let observer = Subscriber::new(
//!     |v| println!("next {v}"),
//!     |e| println!("error {e}"),
//!     || println!("complete"),
//! );
//!
//! // `join` waits for the terminal signal delivered on the observe-on thread.
//! let _ = observable.subscribe(observer).join();
//! ```

mod observe_on;


use std::{error::Error, sync::Arc};

use parking_lot::Mutex;

use crate::errors::{BoxError, ObservableError, ObserverError};
use crate::observer::Observer;
use crate::scheduler::{Scheduler, SchedulerRef, Worker};
use crate::subscription::subscribe::{
    Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
};

use self::observe_on::ObserveOnState;

/// The `Observable` struct represents a cold source of values.
///
/// Nothing happens until `subscribe` is called, and every subscription runs the
/// source again from the start.
pub struct Observable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send>,
}

impl<T: 'static> Observable<T> {
    /// Creates a new `Observable` from a function that drives a `Subscriber`
    /// and returns the `Subscription` controlling it.
    ///
    /// This is the most flexible constructor: the function may spawn threads or
    /// Tokio tasks and return their handles so the subscription can be awaited.
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + 'static) -> Self {
        Observable {
            subscribe_fn: Box::new(sf),
        }
    }

    /// Creates an `Observable` that emits through the provided subscriber on the
    /// thread performing the subscription.
    ///
    /// Returning `Err` from the closure sends the error to the observer. Values
    /// emitted after the subscription was disposed are not delivered; long
    /// running closures can poll `is_disposed` to stop early.
    pub fn create<F>(mut emit: F) -> Self
    where
        F: FnMut(&mut Subscriber<T>) -> Result<(), BoxError> + Send + 'static,
    {
        Observable::new(move |mut subscriber| {
            if let Err(e) = emit(&mut subscriber) {
                subscriber.error(Arc::from(e));
            }
            Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
        })
    }

    /// Creates an `Observable` that emits the given items in order and completes.
    ///
    /// The items are ordinary function arguments, so they are evaluated right
    /// away, whether or not anyone subscribes. Wrap the call in [`defer`] to
    /// postpone the evaluation until subscription time.
    ///
    /// [`defer`]: Observable::defer
    pub fn just(items: impl IntoIterator<Item = T>) -> Self
    where
        T: Clone + Send,
    {
        let items: Vec<T> = items.into_iter().collect();
        Observable::create(move |subscriber| {
            for item in &items {
                if subscriber.is_disposed() {
                    return Ok(());
                }
                subscriber.next(item.clone());
            }
            subscriber.complete();
            Ok(())
        })
    }

    /// Creates an `Observable` whose source is produced by `factory` for every
    /// new subscription.
    ///
    /// The factory runs on the subscribing thread, which is the worker thread
    /// when combined with `subscribe_on`. An `Err` from the factory is sent to
    /// the observer instead of subscribing.
    pub fn defer<F>(mut factory: F) -> Self
    where
        F: FnMut() -> Result<Observable<T>, BoxError> + Send + 'static,
    {
        Observable::new(move |mut subscriber| match factory() {
            Ok(mut observable) => observable.subscribe(subscriber),
            Err(e) => {
                subscriber.error(Arc::from(e));
                Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
            }
        })
    }

    /// Creates an `Observable` that emits no items and signals `error` to every
    /// subscriber.
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let error: ObserverError = Arc::new(error);
        Observable::create(move |subscriber| {
            subscriber.error(Arc::clone(&error));
            Ok(())
        })
    }

    /// Creates an `Observable` that completes immediately.
    pub fn empty() -> Self {
        Observable::create(|subscriber| {
            subscriber.complete();
            Ok(())
        })
    }
}

impl<T> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut s: Subscriber<Self::ObsType>) -> Subscription {
        let disposable = s.disposable();
        // Runs on the caller's thread no matter which schedulers are involved.
        s.notify_subscribed();
        let subscription = (self.subscribe_fn)(s);
        subscription.attach(&disposable)
    }
}

/// Scheduling operators available on every `Observable`.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Subscribes to the source on a worker of `scheduler`, so a synchronous
    /// source emits on that worker's thread.
    ///
    /// `on_subscribe` still runs on the thread that calls `subscribe`. If the
    /// scheduler cannot provide a worker, the observer receives an
    /// [`ObservableError::Scheduler`] error.
    fn subscribe_on(self, scheduler: SchedulerRef) -> Observable<T>
    where
        Self: Sized + Send + 'static,
    {
        let source = Arc::new(Mutex::new(self));

        Observable::new(move |mut o| {
            let disposable = o.disposable();

            let worker = match scheduler.create_worker() {
                Ok(worker) => worker,
                Err(e) => {
                    tracing::error!(scheduler = scheduler.name(), error = %e, "subscribe_on failed to create a worker");
                    o.error(Arc::new(ObservableError::from(e)));
                    return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
                }
            };

            let source = Arc::clone(&source);
            let d = disposable.clone();
            // The task keeps its worker alive until the upstream subscription is made.
            let keep_alive = Arc::clone(&worker);

            worker.schedule(Box::new(move || {
                if d.is_disposed() {
                    return;
                }
                let upstream = source.lock().subscribe(o);
                d.add(move || upstream.release());
                drop(keep_alive);
            }));

            Subscription::new(
                UnsubscribeLogic::Nil,
                SubscriptionHandle::Await(disposable),
            )
        })
    }

    /// Delivers every signal on a worker of `scheduler`. An error cuts ahead of
    /// values that were emitted but not yet delivered.
    fn observe_on(self, scheduler: SchedulerRef) -> Observable<T>
    where
        Self: Sized + Send + 'static,
        T: Send,
    {
        self.observe_on_delay_error(scheduler, false)
    }

    /// Delivers every signal on a worker of `scheduler`, one at a time and in
    /// the order they were emitted.
    ///
    /// With `delay_error` set, an upstream error is delivered only after every
    /// value emitted before it. Otherwise the error is delivered as soon as the
    /// worker gets to run and pending values are dropped.
    fn observe_on_delay_error(mut self, scheduler: SchedulerRef, delay_error: bool) -> Observable<T>
    where
        Self: Sized + Send + 'static,
        T: Send,
    {
        Observable::new(move |mut o| {
            let disposable = o.disposable();

            let worker = match scheduler.create_worker() {
                Ok(worker) => worker,
                Err(e) => {
                    tracing::error!(scheduler = scheduler.name(), error = %e, "observe_on failed to create a worker");
                    o.error(Arc::new(ObservableError::from(e)));
                    return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
                }
            };

            let state = ObserveOnState::new(o, worker, delay_error);
            let release = Arc::clone(&state);
            disposable.add(move || release.release_worker());

            let s_next = Arc::clone(&state);
            let s_error = Arc::clone(&state);
            let s_complete = state;

            let u = Subscriber::chained(
                move |v| s_next.push_next(v),
                move |observable_error| s_error.push_error(observable_error),
                move || s_complete.push_complete(),
                disposable.clone(),
            );

            let upstream = self.subscribe(u);
            disposable.add(move || upstream.release());

            Subscription::new(
                UnsubscribeLogic::Nil,
                SubscriptionHandle::Await(disposable),
            )
        })
    }
}

impl<T: 'static> ObservableExt<T> for Observable<T> {}
