// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend implementation for testing.
//!
//! This module provides `MockBackend`, a configurable in-memory backend that
//! records all calls and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{Backend, Failure, Outcome, Server, ServerStats};

/// Recorded backend call with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall<V> {
    /// A server was registered.
    AddServer {
        /// The registered host.
        host: String,
        /// The registered port.
        port: u16,
    },
    /// A single-key read.
    Get(String),
    /// A multi-key read.
    GetMulti(Vec<String>),
    /// An unconditional store.
    Set {
        /// The stored key.
        key: String,
        /// The stored value.
        value: V,
        /// The requested TTL in seconds.
        ttl: u32,
    },
    /// A store-if-absent.
    Add {
        /// The stored key.
        key: String,
        /// The stored value.
        value: V,
        /// The requested TTL in seconds.
        ttl: u32,
    },
    /// A store-if-present.
    Replace {
        /// The stored key.
        key: String,
        /// The stored value.
        value: V,
        /// The requested TTL in seconds.
        ttl: u32,
    },
    /// A counter increment.
    Increment {
        /// The counter key.
        key: String,
        /// The increment.
        amount: u64,
    },
    /// A counter decrement.
    Decrement {
        /// The counter key.
        key: String,
        /// The decrement.
        amount: u64,
    },
    /// A single-key removal.
    Delete(String),
    /// A multi-key removal.
    DeleteMulti(Vec<String>),
    /// A pool flush.
    Flush,
    /// A key listing.
    AllKeys,
    /// A stats request.
    Stats,
    /// A disconnect.
    Close,
}

type FailPredicate<V> = Box<dyn Fn(&BackendCall<V>) -> bool + Send + Sync>;

#[derive(Debug)]
struct State<V> {
    data: HashMap<String, V>,
    counters: HashMap<String, i64>,
    servers: Vec<Server>,
    closed: bool,
}

/// A configurable mock backend for testing.
///
/// This backend stores values in memory and can be configured to fail
/// calls on demand, making it useful for testing failure notification paths.
/// All calls are recorded for later verification. Clones share state, so a
/// clone kept by the test observes calls made through an adapter that owns
/// the original.
///
/// Counters live apart from regular values: seed them with
/// [`with_counter`](Self::with_counter). Incrementing an unknown counter
/// reports `None`, like a memcached miss.
///
/// # Examples
///
/// ```
/// use cachebuf_backend::{Backend, testing::{BackendCall, MockBackend}};
///
/// let mut backend = MockBackend::<i32>::new();
///
/// backend.set("key", &42, 60).unwrap();
/// assert_eq!(backend.get("key").unwrap(), Some(42));
///
/// assert_eq!(backend.calls(), vec![
///     BackendCall::Set { key: "key".to_string(), value: 42, ttl: 60 },
///     BackendCall::Get("key".to_string()),
/// ]);
/// ```
///
/// # Failure Injection
///
/// ```
/// use cachebuf_backend::{Backend, testing::{BackendCall, MockBackend}};
///
/// let mut backend = MockBackend::<i32>::new();
///
/// // Fail only specific keys
/// backend.fail_when(|call| matches!(call, BackendCall::Get(k) if k == "forbidden"));
/// assert!(backend.get("forbidden").is_err());
/// assert!(backend.get("allowed").is_ok());
/// ```
pub struct MockBackend<V> {
    state: Arc<Mutex<State<V>>>,
    calls: Arc<Mutex<Vec<BackendCall<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockBackend<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("state", &self.state)
            .field("calls", &self.calls)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockBackend<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            calls: Arc::clone(&self.calls),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockBackend<V> {
    /// Creates a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock backend with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<String, V>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                data,
                counters: HashMap::new(),
                servers: Vec::new(),
                closed: false,
            })),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Seeds a counter for `increment`/`decrement`.
    #[must_use]
    pub fn with_counter(self, key: impl Into<String>, value: i64) -> Self {
        self.state.lock().counters.insert(key.into(), value);
        self
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    /// Returns the current value of a counter.
    #[must_use]
    pub fn counter(&self, key: &str) -> Option<i64> {
        self.state.lock().counters.get(key).copied()
    }

    /// Returns the registered servers in registration order.
    #[must_use]
    pub fn servers(&self) -> Vec<Server> {
        self.state.lock().servers.clone()
    }

    /// Returns true once `close` was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<V> MockBackend<V>
where
    V: Clone,
{
    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<V> {
        self.state.lock().data.get(key).cloned()
    }

    /// Sets a predicate that determines when calls should fail.
    ///
    /// The predicate receives the call and returns `true` if it should fail.
    /// A failing call is still recorded but leaves the stored data untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachebuf_backend::testing::{BackendCall, MockBackend};
    ///
    /// let backend: MockBackend<i32> = MockBackend::new();
    ///
    /// // Fail all calls
    /// backend.fail_when(|_| true);
    ///
    /// // Fail only stores
    /// backend.fail_when(|call| matches!(call, BackendCall::Set { .. }));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BackendCall<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all calls to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall<V>> {
        self.calls.lock().clone()
    }

    /// Clears all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Records the call and reports whether it was configured to fail.
    fn record(&self, call: BackendCall<V>) -> Outcome<()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&call));
        let name = call_name(&call);
        self.calls.lock().push(call);
        if fail {
            Err(Failure::new(format!("mock: {name} failed")))
        } else {
            Ok(())
        }
    }

    fn step_counter(&self, key: &str, delta: i64) -> Option<i64> {
        let mut state = self.state.lock();
        let counter = state.counters.get_mut(key)?;
        *counter = counter.saturating_add(delta);
        Some(*counter)
    }
}

fn call_name<V>(call: &BackendCall<V>) -> &'static str {
    match call {
        BackendCall::AddServer { .. } => "addServer",
        BackendCall::Get(_) => "get",
        BackendCall::GetMulti(_) => "getMulti",
        BackendCall::Set { .. } => "set",
        BackendCall::Add { .. } => "add",
        BackendCall::Replace { .. } => "replace",
        BackendCall::Increment { .. } => "increment",
        BackendCall::Decrement { .. } => "decrement",
        BackendCall::Delete(_) => "delete",
        BackendCall::DeleteMulti(_) => "deleteMulti",
        BackendCall::Flush => "flush",
        BackendCall::AllKeys => "getAllKeys",
        BackendCall::Stats => "getStats",
        BackendCall::Close => "close",
    }
}

fn signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

impl<V> Backend<V> for MockBackend<V>
where
    V: Clone,
{
    fn add_server(&mut self, host: &str, port: u16) {
        self.add_servers(&[Server::new(host, port)]);
    }

    fn add_servers(&mut self, servers: &[Server]) {
        for server in servers {
            let call = BackendCall::AddServer {
                host: server.host().to_string(),
                port: server.port(),
            };
            self.calls.lock().push(call);
            self.state.lock().servers.push(server.clone());
        }
    }

    fn get(&mut self, key: &str) -> Outcome<Option<V>> {
        self.record(BackendCall::Get(key.to_string()))?;
        Ok(self.state.lock().data.get(key).cloned())
    }

    fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, V>> {
        self.record(BackendCall::GetMulti(keys.to_vec()))?;
        let state = self.state.lock();
        Ok(keys
            .iter()
            .filter_map(|key| state.data.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    fn set(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        self.record(BackendCall::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        })?;
        self.state.lock().data.insert(key.to_string(), value.clone());
        Ok(true)
    }

    fn add(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        self.record(BackendCall::Add {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        })?;
        let mut state = self.state.lock();
        if state.data.contains_key(key) {
            return Ok(false);
        }
        state.data.insert(key.to_string(), value.clone());
        Ok(true)
    }

    fn replace(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        self.record(BackendCall::Replace {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        })?;
        let mut state = self.state.lock();
        match state.data.get_mut(key) {
            Some(stored) => {
                *stored = value.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.record(BackendCall::Increment {
            key: key.to_string(),
            amount,
        })?;
        Ok(self.step_counter(key, signed(amount)))
    }

    fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.record(BackendCall::Decrement {
            key: key.to_string(),
            amount,
        })?;
        Ok(self.step_counter(key, signed(amount).saturating_neg()))
    }

    fn delete(&mut self, key: &str) -> Outcome<bool> {
        self.record(BackendCall::Delete(key.to_string()))?;
        Ok(self.state.lock().data.remove(key).is_some())
    }

    fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool> {
        self.record(BackendCall::DeleteMulti(keys.to_vec()))?;
        let mut state = self.state.lock();
        for key in keys {
            state.data.remove(key);
        }
        Ok(true)
    }

    fn flush(&mut self) -> Outcome<bool> {
        self.record(BackendCall::Flush)?;
        let mut state = self.state.lock();
        state.data.clear();
        state.counters.clear();
        Ok(true)
    }

    fn all_keys(&mut self) -> Outcome<Vec<String>> {
        self.record(BackendCall::AllKeys)?;
        let mut keys: Vec<String> = self.state.lock().data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn stats(&mut self) -> Outcome<Vec<ServerStats>> {
        self.record(BackendCall::Stats)?;
        let state = self.state.lock();
        let items = state.data.len().to_string();
        Ok(state
            .servers
            .iter()
            .map(|server| ServerStats::from((server.to_string(), [("curr_items", items.as_str())])))
            .collect())
    }

    fn close(&mut self) -> Outcome<bool> {
        self.record(BackendCall::Close)?;
        self.state.lock().closed = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state_and_calls() {
        let observer = MockBackend::<i32>::new();
        let mut backend = observer.clone();

        backend.set("a", &1, 10).unwrap();

        assert_eq!(observer.value("a"), Some(1));
        assert_eq!(observer.calls().len(), 1);
    }

    #[test]
    fn failing_call_is_recorded_but_not_applied() {
        let mut backend = MockBackend::<i32>::new();
        backend.fail_when(|call| matches!(call, BackendCall::Set { .. }));

        let failure = backend.set("a", &1, 10).unwrap_err();

        assert_eq!(failure.reason(), "mock: set failed");
        assert!(!backend.contains_key("a"));
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn clear_failures_restores_success() {
        let mut backend = MockBackend::<i32>::new();
        backend.fail_when(|_| true);
        assert!(backend.get("a").is_err());

        backend.clear_failures();
        assert_eq!(backend.get("a"), Ok(None));
    }

    #[test]
    fn get_multi_omits_absent_keys() {
        let mut backend = MockBackend::with_data(HashMap::from([("a".to_string(), 1)]));
        let found = backend.get_multi(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(found, HashMap::from([("a".to_string(), 1)]));
    }

    #[test]
    fn add_and_replace_respect_existence() {
        let mut backend = MockBackend::<i32>::new();
        assert_eq!(backend.replace("k", &1, 0), Ok(false));
        assert_eq!(backend.add("k", &1, 0), Ok(true));
        assert_eq!(backend.add("k", &2, 0), Ok(false));
        assert_eq!(backend.replace("k", &3, 0), Ok(true));
        assert_eq!(backend.value("k"), Some(3));
    }

    #[test]
    fn counters_step_only_when_seeded() {
        let mut backend = MockBackend::<i32>::new().with_counter("hits", 5);
        assert_eq!(backend.increment("hits", 2), Ok(Some(7)));
        assert_eq!(backend.decrement("hits", 10), Ok(Some(-3)));
        assert_eq!(backend.increment("unknown", 1), Ok(None));
        assert_eq!(backend.counter("hits"), Some(-3));
    }

    #[test]
    fn servers_and_close_are_tracked() {
        let mut backend = MockBackend::<i32>::new();
        backend.add_servers(&[Server::new("a", 1), Server::new("b", 2)]);
        backend.add_server("c", 3);
        assert_eq!(backend.servers().len(), 3);

        let stats = backend.stats().unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].server(), "a:1");

        assert_eq!(backend.close(), Ok(true));
        assert!(backend.is_closed());
    }

    #[test]
    fn flush_and_all_keys() {
        let mut backend = MockBackend::with_data(HashMap::from([("b".to_string(), 2), ("a".to_string(), 1)]));
        assert_eq!(backend.all_keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(backend.flush(), Ok(true));
        assert_eq!(backend.entry_count(), 0);
    }

    #[test]
    fn delete_and_delete_multi() {
        let mut backend = MockBackend::with_data(HashMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3),
        ]));
        assert_eq!(backend.delete("a"), Ok(true));
        assert_eq!(backend.delete("a"), Ok(false));
        assert_eq!(backend.delete_multi(&["b".to_string(), "c".to_string()]), Ok(true));
        assert_eq!(backend.entry_count(), 0);
    }
}
