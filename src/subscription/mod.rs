//! Provides structures and traits related to subscription management.
//!
//! This module includes types such as `Subscriber` for handling observed values,
//! errors, and completions, `Subscription` for controlling and awaiting
//! subscriptions, and `Disposable`, the cancellation handle shared by all hops of
//! one subscription chain.
mod disposable;
pub mod subscribe;

pub use disposable::Disposable;
