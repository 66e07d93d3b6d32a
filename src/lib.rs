//! `rxsched` provides cold observables together with Rx-style schedulers for
//! choosing the threads that produce and consume their values.
//!
//! * Create sources with [`Observable::create`], [`Observable::just`],
//!   [`Observable::defer`], [`Observable::error`] or [`Observable::empty`].
//! * Move the subscription (and therefore a synchronous source) to another thread
//!   with [`ObservableExt::subscribe_on`].
//! * Move the observer callbacks to another thread with
//!   [`ObservableExt::observe_on`] or [`ObservableExt::observe_on_delay_error`].
//! * Pick threads through [`scheduler::Schedulers`]: `new_thread`, `single`,
//!   `computation`, `io`, `trampoline` or a Tokio runtime.
//!
//! Observers receive `on_subscribe` on the subscribing thread, followed by any
//! number of `next` signals and at most one `error` or `complete`. The
//! [`Disposable`] handed to `on_subscribe` cancels delivery for the whole chain.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use rxsched::{scheduler::Schedulers, subscribe::Subscriber, Observable, ObservableExt, Subscribeable};
//!
//! let mut observable = Observable::defer(|| Ok(Observable::just([1, 2, 3])))
//!     .subscribe_on(Schedulers::io())
//!     .observe_on(Schedulers::single());
//!
//! let mut observer = Subscriber::on_next(|v| println!("{v}"));
//! observer.on_subscribe(|_| println!("subscribed"));
//!
//! let finished = observable.subscribe(observer).join_timeout(Duration::from_secs(2));
//! assert!(finished);
//! ```

pub mod config;
pub mod demo;
pub mod errors;
mod observable;
mod observer;
pub mod scheduler;
mod subscription;

pub use observable::*;
pub use observer::Observer;
pub use subscription::{subscribe, Disposable};

pub use subscribe::{Subscribeable, Unsubscribeable};
