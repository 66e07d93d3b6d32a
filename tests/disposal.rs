mod generate_observable;
mod register_emissions;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc,
    },
    time::Duration,
};

use generate_observable::generate_u32_observable;
use register_emissions::register_emissions_subscriber;
use rxsched::{
    scheduler::Schedulers,
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable, ObservableExt, Observer, Subscribeable, Unsubscribeable,
};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn dispose_in_on_subscribe_silences_synchronous_source() {
    let emitted = Arc::new(AtomicUsize::new(0));
    let emitted_c = Arc::clone(&emitted);

    let mut observable = Observable::create(move |o| {
        for i in 0..3 {
            emitted_c.fetch_add(1, Ordering::SeqCst);
            o.next(i);
        }
        o.complete();
        Ok(())
    });

    let (mut s, emissions) = register_emissions_subscriber();
    s.on_subscribe(|d| d.dispose());
    let subscription = observable.subscribe(s);

    // Without `subscribe_on` the source still runs, nothing is delivered.
    assert_eq!(emitted.load(Ordering::SeqCst), 3);
    assert!(emissions.nexts().is_empty());
    assert_eq!(emissions.completes(), 0);
    assert!(subscription.is_disposed());
}

#[test]
fn dispose_in_on_subscribe_skips_scheduled_source() {
    let emitted = Arc::new(AtomicUsize::new(0));
    let emitted_c = Arc::clone(&emitted);

    let mut observable = Observable::create(move |o| {
        emitted_c.fetch_add(1, Ordering::SeqCst);
        o.next(1);
        o.complete();
        Ok(())
    })
    .subscribe_on(Schedulers::new_thread())
    .observe_on(Schedulers::new_thread());

    let (mut s, emissions) = register_emissions_subscriber();
    s.on_subscribe(|d| d.dispose());
    let subscription = observable.subscribe(s);
    assert!(subscription.join_timeout(WAIT));

    // Give a wrongly scheduled source the chance to show up.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(emitted.load(Ordering::SeqCst), 0);
    assert!(emissions.nexts().is_empty());
    assert_eq!(emissions.labels(), ["subscribe"]);
}

#[test]
fn unsubscribe_stops_thread_backed_source() {
    let (last_tx, last_rx) = mpsc::channel();
    let mut observable = generate_u32_observable(10_000, move |last| {
        let _ = last_tx.send(last);
    });

    let (s, emissions) = register_emissions_subscriber();
    let subscription = observable.subscribe(s);
    std::thread::sleep(Duration::from_millis(20));
    subscription.unsubscribe();

    let last = last_rx.recv_timeout(WAIT).unwrap();
    assert!(last < 10_000, "source kept emitting after unsubscribe");
    assert_eq!(emissions.completes(), 0, "complete delivered after unsubscribe");
}

#[test]
fn unsubscribe_stops_observe_on_delivery() {
    let mut observable = generate_u32_observable(10_000, |_| {}).observe_on(Schedulers::new_thread());

    let (s, emissions) = register_emissions_subscriber();
    let subscription = observable.subscribe(s);
    let disposable = subscription.disposable().cloned().unwrap();

    std::thread::sleep(Duration::from_millis(20));
    subscription.unsubscribe();
    assert!(disposable.is_disposed());

    std::thread::sleep(Duration::from_millis(20));
    let delivered = emissions.nexts().len();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(emissions.nexts().len(), delivered);
    assert!(
        delivered < 5_000,
        "{delivered} values delivered after unsubscribe"
    );
    assert_eq!(emissions.completes(), 0);
}

#[test]
fn completed_scheduled_chain_is_not_disposed() {
    let mut plain = Observable::just([1, 2]);
    let mut scheduled = Observable::just([1, 2])
        .subscribe_on(Schedulers::new_thread())
        .observe_on(Schedulers::new_thread());

    for observable in [&mut plain, &mut scheduled] {
        let (s, emissions) = register_emissions_subscriber();
        let subscription = observable.subscribe(s);
        let disposable = subscription.disposable().cloned().unwrap();

        assert!(subscription.join_timeout(WAIT));
        assert_eq!(emissions.completes(), 1);
        assert!(disposable.is_settled());
        assert!(
            !disposable.is_disposed(),
            "completing the chain must not dispose it"
        );
    }
}

#[test]
fn unsubscribe_after_completion_still_disposes() {
    let mut observable = Observable::just([1]).subscribe_on(Schedulers::new_thread());

    let (s, _emissions) = register_emissions_subscriber();
    let subscription = observable.subscribe(s);
    let disposable = subscription.disposable().cloned().unwrap();
    assert!(disposable.wait_timeout(WAIT));
    assert!(!disposable.is_disposed());

    subscription.unsubscribe();
    assert!(disposable.is_disposed());
}

#[test]
fn teardown_runs_once_on_completion() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let teardowns_c = Arc::clone(&teardowns);

    let mut observable = Observable::new(move |mut o: Subscriber<i32>| {
        o.next(1);
        o.complete();
        let teardowns = Arc::clone(&teardowns_c);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                teardowns.fetch_add(1, Ordering::SeqCst);
            })),
            SubscriptionHandle::Nil,
        )
    });

    let (s, _emissions) = register_emissions_subscriber();
    let subscription = observable.subscribe(s);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    // Unsubscribing a finished subscription has no further effect.
    subscription.unsubscribe();
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn wrapped_unsubscribe_reaches_inner_subscription() {
    let inner_calls = Arc::new(AtomicUsize::new(0));
    let inner_calls_c = Arc::clone(&inner_calls);

    let mut observable = Observable::new(move |_o: Subscriber<i32>| {
        let inner_calls = Arc::clone(&inner_calls_c);
        let inner = Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                inner_calls.fetch_add(1, Ordering::SeqCst);
            })),
            SubscriptionHandle::Nil,
        );
        Subscription::new(
            UnsubscribeLogic::Wrapped(Box::new(inner)),
            SubscriptionHandle::Nil,
        )
    });

    let (s, _emissions) = register_emissions_subscriber();
    let subscription = observable.subscribe(s);
    assert_eq!(inner_calls.load(Ordering::SeqCst), 0);

    subscription.unsubscribe();
    assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn future_unsubscribe_logic_runs_on_runtime() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));

    let mut observable = Observable::new(move |_o: Subscriber<i32>| {
        let tx = Arc::clone(&tx);
        Subscription::new(
            UnsubscribeLogic::Future(Box::pin(async move {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
            })),
            SubscriptionHandle::Nil,
        )
    });

    let (s, _emissions) = register_emissions_subscriber();
    observable.subscribe(s).unsubscribe();

    assert!(tokio::time::timeout(WAIT, rx).await.is_ok());
}
