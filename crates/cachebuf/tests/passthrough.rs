// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for direct execution outside buffering sessions.

use std::collections::HashMap;

use cachebuf::Adapter;
use cachebuf_backend::{
    DEFAULT_TTL, NEVER_EXPIRE, Server,
    testing::{BackendCall, MockBackend},
};

type TestResult = cachebuf::Result<()>;

fn adapter() -> (Adapter<i32, MockBackend<i32>>, MockBackend<i32>) {
    let mock = MockBackend::new();
    (Adapter::new(mock.clone()), mock)
}

#[test]
fn every_call_reaches_backend_once() -> TestResult {
    let (mut cache, mock) = adapter();

    cache.set("k", 1)?;
    cache.get("k")?;
    cache.delete("k")?;

    assert_eq!(
        mock.calls(),
        vec![
            BackendCall::Set {
                key: "k".to_string(),
                value: 1,
                ttl: DEFAULT_TTL
            },
            BackendCall::Get("k".to_string()),
            BackendCall::Delete("k".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn zero_ttl_is_passed_verbatim() -> TestResult {
    let (mut cache, mock) = adapter();

    cache.set_with_ttl("a", 1, NEVER_EXPIRE)?;
    cache.add_with_ttl("b", 2, NEVER_EXPIRE)?;
    cache.replace_with_ttl("b", 3, NEVER_EXPIRE)?;

    assert!(mock.calls().iter().all(|call| matches!(
        call,
        BackendCall::Set { ttl: 0, .. } | BackendCall::Add { ttl: 0, .. } | BackendCall::Replace { ttl: 0, .. }
    )));
    Ok(())
}

#[test]
fn add_and_replace_report_backend_answer() -> TestResult {
    let (mut cache, _mock) = adapter();

    assert!(!cache.replace("k", 1)?);
    assert!(cache.add("k", 1)?);
    assert!(!cache.add("k", 2)?);
    assert!(cache.replace("k", 3)?);
    assert_eq!(cache.get("k")?, Some(3));
    Ok(())
}

#[test]
fn counters_default_to_one() -> TestResult {
    let mock = MockBackend::new().with_counter("hits", 10);
    let mut cache: Adapter<i32, _> = Adapter::new(mock.clone());

    assert_eq!(cache.increment("hits")?, Some(11));
    assert_eq!(cache.increment_by("hits", 5)?, Some(16));
    assert_eq!(cache.decrement("hits")?, Some(15));
    assert_eq!(cache.decrement_by("hits", 20)?, Some(-5));
    assert_eq!(cache.increment("missing")?, None);

    assert!(mock.calls().contains(&BackendCall::Increment {
        key: "hits".to_string(),
        amount: 1
    }));
    Ok(())
}

#[test]
fn pool_wide_operations() -> TestResult {
    let mock = MockBackend::with_data(HashMap::from([("b".to_string(), 2), ("a".to_string(), 1)]));
    let mut cache = Adapter::new(mock.clone());
    cache.add_servers(&[Server::new("cache-1", 11211), Server::new("cache-2", 11211)]);

    assert_eq!(cache.all_keys()?, vec!["a".to_string(), "b".to_string()]);
    let stats = cache.stats()?;
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[1].server(), "cache-2:11211");

    assert!(cache.flush()?);
    assert_eq!(mock.entry_count(), 0);
    Ok(())
}

#[test]
fn failures_return_sentinels() -> TestResult {
    let mock = MockBackend::with_data(HashMap::from([("k".to_string(), 1)]));
    let mut cache = Adapter::new(mock.clone());
    mock.fail_when(|_| true);

    assert_eq!(cache.get("k")?, None);
    assert!(!cache.set("k", 2)?);
    assert!(!cache.delete_multi(["k"])?);
    assert_eq!(cache.increment("k")?, None);
    assert!(cache.all_keys()?.is_empty());
    assert!(cache.stats()?.is_empty());

    let values = cache.get_multi(["k", "j"])?;
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|(_, value)| value.is_none()));

    assert_eq!(mock.value("k"), Some(1));
    Ok(())
}

#[test]
fn add_server_passes_through() {
    let (mut cache, mock) = adapter();
    cache.add_server("localhost", 11211);

    assert_eq!(mock.servers(), vec![Server::new("localhost", 11211)]);
    assert_eq!(cache.backend().servers().len(), 1);
}

#[test]
fn close_is_not_buffered() -> TestResult {
    let (mut cache, mock) = adapter();

    cache.begin_buffer()?;
    assert!(cache.close());

    assert!(mock.is_closed());
    assert!(cache.buffered_operations().is_empty());
    Ok(())
}
