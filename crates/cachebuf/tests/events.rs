// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for query notifications.

use std::sync::Arc;

use cachebuf::{Adapter, Event, EventDispatcher, EventKind, OperationKind};
use cachebuf_backend::testing::{BackendCall, MockBackend};
use parking_lot::Mutex;

type TestResult = cachebuf::Result<()>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Seen {
    Before(OperationKind, Vec<String>, bool),
    After(OperationKind, Vec<String>, bool),
    Fail(String),
}

fn record(log: &Arc<Mutex<Vec<Seen>>>) -> impl Fn(&Event<'_>) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |event| {
        let seen = match event {
            Event::Before(query) => Seen::Before(
                query.operation(),
                query.target().keys().into_iter().map(String::from).collect(),
                query.is_mutable(),
            ),
            Event::After(query) => Seen::After(
                query.operation(),
                query.target().keys().into_iter().map(String::from).collect(),
                query.is_mutable(),
            ),
            Event::Fail(failure) => Seen::Fail(failure.reason().to_string()),
        };
        log.lock().push(seen);
    }
}

fn observed() -> (Adapter<i32, MockBackend<i32>>, MockBackend<i32>, Arc<Mutex<Vec<Seen>>>) {
    let mock = MockBackend::new();
    let mut cache = Adapter::new(mock.clone());
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::Before, EventKind::After, EventKind::Fail] {
        cache.bind(kind, record(&log));
    }
    (cache, mock, log)
}

#[test]
fn direct_execution_emits_before_and_after() -> TestResult {
    let (mut cache, _mock, log) = observed();

    cache.set("k", 1)?;

    assert_eq!(
        *log.lock(),
        vec![
            Seen::Before(OperationKind::Set, vec!["k".to_string()], true),
            Seen::After(OperationKind::Set, vec!["k".to_string()], true),
        ]
    );
    Ok(())
}

#[test]
fn failure_emits_fail_between_before_and_after() -> TestResult {
    let (mut cache, mock, log) = observed();
    mock.fail_when(|call| matches!(call, BackendCall::Get(_)));

    cache.get("k")?;

    assert_eq!(
        *log.lock(),
        vec![
            Seen::Before(OperationKind::Get, vec!["k".to_string()], false),
            Seen::Fail("mock: get failed".to_string()),
            Seen::After(OperationKind::Get, vec!["k".to_string()], false),
        ]
    );
    Ok(())
}

#[test]
fn replay_emits_events_per_operation() -> TestResult {
    let (mut cache, _mock, log) = observed();

    cache.begin_buffer()?;
    cache.set("a", 1)?;
    cache.delete_multi(["a", "b"])?;
    cache.get("a")?;
    assert!(log.lock().is_empty(), "queued and shadowed calls emit nothing");

    cache.commit_buffer();

    let log = log.lock();
    assert_eq!(log.len(), 4);
    assert_eq!(log[2], Seen::Before(OperationKind::DeleteMulti, vec!["a".to_string(), "b".to_string()], true));
    Ok(())
}

#[test]
fn failed_replay_is_bracketed_and_replay_continues() -> TestResult {
    let (mut cache, mock, log) = observed();
    mock.fail_when(|call| matches!(call, BackendCall::Set { key, .. } if key == "a"));

    cache.begin_buffer()?;
    cache.set("a", 1)?;
    cache.set("b", 2)?;
    let report = cache.commit_buffer();

    assert_eq!(report.failed(), 1);
    assert_eq!(
        *log.lock(),
        vec![
            Seen::Before(OperationKind::Set, vec!["a".to_string()], true),
            Seen::Fail("mock: set failed".to_string()),
            Seen::After(OperationKind::Set, vec!["a".to_string()], true),
            Seen::Before(OperationKind::Set, vec!["b".to_string()], true),
            Seen::After(OperationKind::Set, vec!["b".to_string()], true),
        ]
    );
    Ok(())
}

#[test]
fn pool_operations_report_no_keys() -> TestResult {
    let (mut cache, _mock, log) = observed();

    cache.flush()?;

    assert_eq!(log.lock()[0], Seen::Before(OperationKind::Flush, Vec::new(), false));
    Ok(())
}

#[test]
fn multiple_handlers_run_in_registration_order() -> TestResult {
    let mut cache = Adapter::new(MockBackend::<i32>::new());
    let order = Arc::new(Mutex::new(Vec::new()));
    for id in 0..3 {
        let order = Arc::clone(&order);
        cache.bind(EventKind::After, move |_| order.lock().push(id));
    }

    cache.get("k")?;

    assert_eq!(*order.lock(), vec![0, 1, 2]);
    Ok(())
}

#[test]
fn injected_dispatcher_receives_events() -> TestResult {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_listener(EventKind::Before, record(&log));

    let mut cache = Adapter::with_dispatcher(MockBackend::<i32>::new(), dispatcher);
    cache.get_multi(["x", "y"])?;

    assert_eq!(
        *log.lock(),
        vec![Seen::Before(OperationKind::GetMulti, vec!["x".to_string(), "y".to_string()], false)]
    );
    Ok(())
}

#[test]
fn dispatcher_is_built_on_first_bind() {
    let mut cache = Adapter::new(MockBackend::<i32>::new());
    assert!(cache.dispatcher().is_none());

    cache.bind(EventKind::Fail, |_| {});
    assert_eq!(cache.dispatcher().map(|d| d.listener_count(EventKind::Fail)), Some(1));
}

#[test]
fn close_emits_no_events() {
    let (mut cache, _mock, log) = observed();
    cache.close();
    assert!(log.lock().is_empty());
}
