use std::time::Duration;

use rxsched::demo::{
    create_scenario, just_scenario, Callback, DemoOptions, CREATE_ERROR, CREATE_MESSAGES,
    JUST_VALUE,
};

fn options() -> DemoOptions {
    DemoOptions {
        wait: Duration::from_secs(5),
        ..DemoOptions::default()
    }
}

#[test]
fn create_scenario_hops_between_threads() {
    let report = create_scenario(&options());
    assert!(report.finished);

    let subscribed: Vec<_> = report.events_of(Callback::Subscribed).collect();
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].thread, report.caller_thread);
    assert_eq!(report.events[0].callback, Callback::Subscribed);

    let source = report.events_of(Callback::SourceStarted).next().unwrap();
    assert!(source.thread.starts_with("RxNewThreadScheduler-"));
    assert_ne!(source.thread, report.caller_thread);

    assert_eq!(report.next_payloads(), CREATE_MESSAGES);
    let errors: Vec<_> = report.events_of(Callback::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].payload.as_deref(), Some(CREATE_ERROR));
    assert_eq!(report.events_of(Callback::Complete).count(), 0);
    assert_eq!(report.events.last().unwrap().callback, Callback::Error);

    let observe_thread = &errors[0].thread;
    assert!(observe_thread.starts_with("RxNewThreadScheduler-"));
    assert_ne!(*observe_thread, source.thread);
    assert!(report
        .events_of(Callback::Next)
        .all(|e| e.thread == *observe_thread));
}

#[test]
fn just_scenario_defers_value_to_subscribe_thread() {
    let report = just_scenario(&options());
    assert!(report.finished);

    let source = report.events_of(Callback::SourceStarted).next().unwrap();
    assert!(source.thread.starts_with("RxNewThreadScheduler-"));

    assert_eq!(report.next_payloads(), [JUST_VALUE.to_string()]);
    assert_eq!(report.events_of(Callback::Complete).count(), 1);
    assert_eq!(report.events_of(Callback::Error).count(), 0);

    let complete = report.events_of(Callback::Complete).next().unwrap();
    assert_ne!(complete.thread, source.thread);
    assert_ne!(complete.thread, report.caller_thread);
}

#[test]
fn disposing_on_subscribe_leaves_only_the_subscribe_callback() {
    let options = DemoOptions {
        dispose_on_subscribe: true,
        ..options()
    };

    for report in [create_scenario(&options), just_scenario(&options)] {
        assert!(report.finished);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].callback, Callback::Subscribed);
    }
}
