use std::{
    any::Any,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Wake, Waker},
    thread::JoinHandle as ThreadJoinHandle,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio::runtime;
use tokio::task::{self, JoinHandle};

use crate::errors::ObserverError;
use crate::observer::Observer;
use crate::subscription::Disposable;

const JOIN_TASK_MISUSE: &str = "Handle is a Tokio task handle. When working with Tokio, use `join_concurrent().await` to await the completion of observables.";

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The subscriber's `on_subscribe` hook runs on the calling thread before the
    /// stream starts. The returned `Subscription` can be used to unsubscribe or
    /// to wait for the stream to finish.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
pub trait Unsubscribeable {
    /// Disposes the subscription chain and runs its unsubscribe logic.
    ///
    /// The `Subscription` instance that this method is called on is consumed, making it
    /// unusable after the `unsubscribe` operation.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(ObserverError) + Send>;
type SubscribedFn = Box<dyn FnOnce(&Disposable) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable`.
///
/// Users can create a `Subscriber` instance using the `new` method and provide
/// custom functions to handle the `next`, `error`, and `complete` events, or wrap
/// any [`Observer`] implementation with [`from_observer`](Subscriber::from_observer).
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    subscribed_fn: Option<SubscribedFn>,
    disposable: Disposable,
    // Operator-internal subscribers share the downstream `Disposable` but must
    // not settle the chain when they see a terminal signal.
    chained: bool,
    completed: bool,
    errored: bool,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(ObserverError) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            subscribed_fn: None,
            disposable: Disposable::new(),
            chained: false,
            completed: false,
            errored: false,
        }
    }

    /// Create a new Subscriber with the provided `next` function.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            subscribed_fn: None,
            disposable: Disposable::new(),
            chained: false,
            completed: false,
            errored: false,
        }
    }

    /// Wraps an [`Observer`] implementation so it can be passed to `subscribe`.
    pub fn from_observer<O>(observer: O) -> Self
    where
        O: Observer<NextFnType = NextFnType> + Send + 'static,
        NextFnType: 'static,
    {
        let observer = Arc::new(Mutex::new(observer));
        let o_next = Arc::clone(&observer);
        let o_error = Arc::clone(&observer);
        let o_complete = Arc::clone(&observer);

        let mut s = Subscriber::new(
            move |v| o_next.lock().next(v),
            move |e| o_error.lock().error(e),
            move || o_complete.lock().complete(),
        );
        s.on_subscribe(move |d| observer.lock().subscribed(d));
        s
    }

    pub(crate) fn chained(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(ObserverError) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
        disposable: Disposable,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            subscribed_fn: None,
            disposable,
            chained: true,
            completed: false,
            errored: false,
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    ///
    /// It takes an `Arc` wrapping a trait object that implements the `Error`,
    /// `Send`, and `Sync` traits as its parameter.
    pub fn on_error(&mut self, error_fn: impl FnMut(ObserverError) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Set the function called once when the subscription starts.
    ///
    /// It runs on the thread calling `subscribe`, even when `subscribe_on` or
    /// `observe_on` move the rest of the work to other threads. Disposing the
    /// received `Disposable` suppresses all later callbacks.
    pub fn on_subscribe(&mut self, subscribed_fn: impl FnOnce(&Disposable) + 'static + Send) {
        self.subscribed_fn = Some(Box::new(subscribed_fn));
    }

    /// Returns the cancellation handle shared by this subscription chain.
    #[must_use]
    pub fn disposable(&self) -> Disposable {
        self.disposable.clone()
    }

    /// Sources can poll this to stop emitting once the subscriber is no longer
    /// interested.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposable.is_disposed()
    }

    pub(crate) fn notify_subscribed(&mut self) {
        if let Some(subscribed_fn) = self.subscribed_fn.take() {
            subscribed_fn(&self.disposable);
        }
    }

    fn is_terminated(&self) -> bool {
        self.completed || self.errored
    }

    fn finish(&self) {
        if !self.chained {
            self.disposable.settle();
        }
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn subscribed(&mut self, disposable: &Disposable) {
        if let Some(subscribed_fn) = self.subscribed_fn.take() {
            subscribed_fn(disposable);
        }
    }

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_terminated() {
            tracing::debug!("next signal after terminal event dropped");
            return;
        }
        if self.disposable.is_disposed() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.is_terminated() || self.disposable.is_disposed() {
            return;
        }
        self.completed = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
        self.finish();
    }

    fn error(&mut self, observable_error: ObserverError) {
        if self.is_terminated() || self.disposable.is_disposed() {
            tracing::debug!(error = %observable_error, "undeliverable error dropped");
            return;
        }
        self.errored = true;
        match &mut self.error_fn {
            Some(efn) => (efn)(observable_error),
            None => {
                tracing::warn!(error = %observable_error, "error signal reached a subscriber without an error handler");
            }
        }
        self.finish();
    }
}

/// Enumeration representing different types of handles used by `Subscription` to
/// await asynchronous tasks or threads.
pub enum SubscriptionHandle {
    /// No specific handle for task or thread awaiting.
    Nil,

    /// Holds a join handle for awaiting an asynchronous observable using Tokio task.
    JoinTask(JoinHandle<()>),

    /// Holds a join handle for awaiting an asynchronous observable using OS thread.
    JoinThread(ThreadJoinHandle<()>),

    /// Waits until the chain owning the `Disposable` terminates or is disposed.
    /// Returned by scheduling operators whose work runs on scheduler workers.
    Await(Disposable),
}

/// Represents a subscription to an observable, allowing control over the
/// subscription.
///
/// This subscription can be used to unsubscribe, and can also be used to await
/// asynchronous observables that use scheduler workers, `Tokio` tasks or OS threads.
pub struct Subscription {
    pub(crate) unsubscribe_logic: UnsubscribeLogic,
    pub(crate) subscription_future: SubscriptionHandle,
    pub(crate) runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
    disposable: Option<Disposable>,
}

impl Subscription {
    /// Creates a new Subscription instance with the specified unsubscribe logic and
    /// subscription handle.
    ///
    /// The `unsubscribe_logic` parameter defines the logic to execute upon
    /// unsubscribing from the observable. See [`UnsubscribeLogic`] for more details
    /// on available unsubscribe strategies.
    ///
    /// The `subscription_future` parameter holds a handle for awaiting asynchronous
    /// tasks or threads associated with the subscription. See [`SubscriptionHandle`]
    /// for details on the types of handles.
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        let runtime_handle = tokio::runtime::Handle::try_current();
        Subscription {
            unsubscribe_logic,
            subscription_future,
            runtime_handle,
            disposable: None,
        }
    }

    /// Moves the unsubscribe logic into the chain's teardowns and binds the
    /// subscription to `disposable`.
    pub(crate) fn attach(self, disposable: &Disposable) -> Subscription {
        let Subscription {
            unsubscribe_logic,
            subscription_future,
            runtime_handle,
            ..
        } = self;

        if !matches!(unsubscribe_logic, UnsubscribeLogic::Nil) {
            disposable.add(move || unsubscribe_logic.unsubscribe(runtime_handle));
        }

        Subscription {
            unsubscribe_logic: UnsubscribeLogic::Nil,
            subscription_future,
            runtime_handle: tokio::runtime::Handle::try_current(),
            disposable: Some(disposable.clone()),
        }
    }

    /// Runs the subscription's own unsubscribe logic without disposing the
    /// chain. Operators register this as a teardown for their upstream, so a
    /// chain that settled through a terminal signal is not reported as
    /// disposed.
    pub(crate) fn release(self) {
        self.unsubscribe_logic.unsubscribe(self.runtime_handle);
    }

    /// Returns the chain's `Disposable` for subscriptions produced by `subscribe`.
    #[must_use]
    pub fn disposable(&self) -> Option<&Disposable> {
        self.disposable.as_ref()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposable.as_ref().is_some_and(Disposable::is_disposed)
    }

    /// Awaits the completion of the asynchronous task, thread or scheduler work
    /// associated with this subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if joining a thread or awaiting a task used by the
    /// observable fails.
    pub async fn join_concurrent(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => {
                let r = task_handle.await;
                r.map_err(|e| Box::new(e) as Box<dyn Any + Send>)
            }
            SubscriptionHandle::JoinThread(thread_handle) => {
                task::spawn_blocking(move || thread_handle.join())
                    .await
                    .map_err(|e| Box::new(e) as Box<dyn Any + Send>)?
            }
            SubscriptionHandle::Await(disposable) => task::spawn_blocking(move || disposable.wait())
                .await
                .map_err(|e| Box::new(e) as Box<dyn Any + Send>),
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    /// Blocks the current thread until the observable finishes.
    ///
    /// OS thread handles are joined, scheduler-driven subscriptions are awaited
    /// until their terminal signal or disposal. Observables that never terminate
    /// block forever; use [`join_timeout`](Subscription::join_timeout) for those.
    ///
    /// # Errors
    ///
    /// Returns an error if joining a thread used by the observable fails, or if
    /// the handle is a `Tokio` task, which has to be awaited with
    /// `join_concurrent().await` instead.
    pub fn join(self) -> Result<(), Box<dyn Any + Send>> {
        match self.subscription_future {
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Await(disposable) => {
                disposable.wait();
                Ok(())
            }
            SubscriptionHandle::Nil => Ok(()),
            SubscriptionHandle::JoinTask(_) => Err(Box::new(JOIN_TASK_MISUSE)),
        }
    }

    /// Like [`join`](Subscription::join) but gives up after `timeout`. Returns
    /// `true` if the observable finished in time. A thread or task that
    /// panicked, or a cancelled task, counts as not finished.
    ///
    /// Thread and task handles offer no timed wait, so they are polled with a
    /// growing pause of at most 20 ms.
    #[must_use]
    pub fn join_timeout(self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        match self.subscription_future {
            SubscriptionHandle::Nil => true,
            SubscriptionHandle::Await(disposable) => disposable.wait_timeout(timeout),
            SubscriptionHandle::JoinThread(thread_handle) => {
                poll_until(deadline, || thread_handle.is_finished())
                    && thread_handle.join().is_ok()
            }
            SubscriptionHandle::JoinTask(task_handle) => {
                poll_until(deadline, || task_handle.is_finished())
                    && finished_task_succeeded(task_handle)
            }
        }
    }
}

/// Upper bound for the pause between two polls in `join_timeout`.
const MAX_POLL_PAUSE: Duration = Duration::from_millis(20);

fn poll_until(deadline: Instant, mut finished: impl FnMut() -> bool) -> bool {
    let mut pause = Duration::from_millis(1);
    while !finished() {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(pause.min(deadline - now));
        pause = (pause * 2).min(MAX_POLL_PAUSE);
    }
    true
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

// The task is finished, so a single poll yields its outcome.
fn finished_task_succeeded(mut task_handle: JoinHandle<()>) -> bool {
    let waker = Waker::from(Arc::new(NoopWake));
    let mut cx = Context::from_waker(&waker);
    match Pin::new(&mut task_handle).poll(&mut cx) {
        Poll::Ready(Ok(())) => true,
        Poll::Ready(Err(e)) => {
            tracing::warn!(error = %e, "subscription task did not complete");
            false
        }
        Poll::Pending => false,
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        if let Some(disposable) = &self.disposable {
            disposable.dispose();
        }
        self.unsubscribe_logic.unsubscribe(self.runtime_handle);
    }
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous unsubscribe logic represented by a future. Use if you need to
    /// spawn `Tokio` tasks or `.await` as a part of the unsubscribe logic.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self, runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Ok(handle) => {
                    handle.spawn(future);
                }
                Err(e) => {
                    tracing::error!(error = %e, "future unsubscribe logic created outside of a Tokio runtime, skipped");
                }
            },
        }
    }
}
