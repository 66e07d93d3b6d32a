use crate::errors::ObserverError;
use crate::subscription::Disposable;

/// Consumer of the signals emitted by an `Observable`.
///
/// A well-behaved source calls `next` zero or more times followed by at most one
/// of `error` or `complete`. `subscribed` is called once per subscription on the
/// thread that called `subscribe`, before the source starts emitting.
pub trait Observer {
    type NextFnType;

    /// Receives the `Disposable` of the new subscription. Disposing it here
    /// suppresses every later callback. A source that already started may keep
    /// running.
    fn subscribed(&mut self, _disposable: &Disposable) {}

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: ObserverError);
}
