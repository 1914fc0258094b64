// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The buffering execution engine.
//!
//! [`Engine::execute`] is the single chokepoint for every façade call. While idle it
//! performs operations directly. While buffering it answers reads from the shadow when
//! it can, queues sets and deletes, and rejects everything else.

use std::collections::HashMap;

use cachebuf_backend::{Backend, MultiValue, Outcome};

use crate::{
    Error, ErrorKind, EventDispatcher, Operation, Result,
    buffer::{BufferSession, CommitReport},
    events::{Event, QueryEvent},
    reply::Reply,
    telemetry,
};

#[derive(Debug)]
pub(crate) struct Engine<V, B> {
    backend: B,
    dispatcher: Option<EventDispatcher>,
    session: Option<BufferSession<V>>,
}

impl<V, B> Engine<V, B> {
    pub(crate) fn new(backend: B, dispatcher: Option<EventDispatcher>) -> Self {
        Self {
            backend,
            dispatcher,
            session: None,
        }
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub(crate) fn dispatcher(&self) -> Option<&EventDispatcher> {
        self.dispatcher.as_ref()
    }

    /// Returns the dispatcher, creating it on first use.
    pub(crate) fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        self.dispatcher.get_or_insert_with(EventDispatcher::new)
    }

    pub(crate) fn is_buffering(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn buffered_operations(&self) -> &[Operation<V>] {
        match &self.session {
            Some(session) => session.queue(),
            None => &[],
        }
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::caused_by(
                ErrorKind::DuplicateAction,
                "a buffering session is already active",
            ));
        }
        self.session = Some(BufferSession::new());
        telemetry::record_begin();
        Ok(())
    }

    pub(crate) fn rollback(&mut self) {
        match self.session.take() {
            Some(session) => telemetry::record_rollback(session.len()),
            None => telemetry::record_idle("rollback"),
        }
    }

    fn notify(&self, event: &Event<'_>) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(event);
        }
    }
}

impl<V, B> Engine<V, B>
where
    V: Clone,
    B: Backend<V>,
{
    /// Runs an operation directly or hands it to the active buffering session.
    pub(crate) fn execute(&mut self, operation: Operation<V>) -> Result<Reply<V>> {
        if !self.is_buffering() {
            return Ok(self.perform_or_sentinel(&operation));
        }

        let kind = operation.kind();
        if !kind.is_bufferable() {
            return Err(Error::caused_by(
                ErrorKind::OperationNotSupported,
                format!("{kind} is not supported while buffering"),
            ));
        }

        match operation {
            Operation::Get { ref key } => {
                if let Some(staged) = self.lookup(key) {
                    return Ok(Reply::Value(staged));
                }
                Ok(self.perform_or_sentinel(&operation))
            }
            Operation::GetMulti { ref keys } => {
                let mut resolved = HashMap::new();
                let mut absent = Vec::new();
                for key in keys {
                    match self.lookup(key) {
                        Some(staged) => {
                            resolved.insert(key.as_str(), staged);
                        }
                        None => absent.push(key.clone()),
                    }
                }

                let fetched = if absent.is_empty() {
                    MultiValue::new()
                } else {
                    self.perform_or_sentinel(&Operation::GetMulti { keys: absent }).into_values()
                };

                let merged = keys
                    .iter()
                    .map(|key| {
                        let value = match resolved.get(key.as_str()) {
                            Some(staged) => staged.clone(),
                            None => fetched.get(key).cloned(),
                        };
                        (key.clone(), value)
                    })
                    .collect();
                Ok(Reply::Values(merged))
            }
            _ => {
                if let Some(session) = self.session.as_mut() {
                    session.stage(operation);
                }
                Ok(Reply::Queued)
            }
        }
    }

    /// Resolves a key against the shadow of the active session.
    fn lookup(&self, key: &str) -> Option<Option<V>> {
        self.session
            .as_ref()
            .and_then(|session| session.lookup(key))
            .map(Option::<&V>::cloned)
    }

    /// Replays the queued operations in issue order and leaves buffering mode.
    ///
    /// A failing operation is fail-notified and the replay moves on; mutations that
    /// already reached the backend stay applied.
    pub(crate) fn commit(&mut self) -> CommitReport {
        let Some(session) = self.session.take() else {
            telemetry::record_idle("commit");
            return CommitReport::default();
        };

        let queue = session.into_queue();
        let failed = queue.iter().filter(|operation| self.perform(operation).is_err()).count();

        let report = CommitReport::new(queue.len(), failed);
        telemetry::record_commit(report);
        report
    }

    /// Disconnects the backend without emitting query events.
    pub(crate) fn close(&mut self) -> bool {
        match self.backend.close() {
            Ok(closed) => {
                telemetry::record_close(None);
                closed
            }
            Err(failure) => {
                telemetry::record_close(Some(&failure));
                false
            }
        }
    }

    fn perform_or_sentinel(&mut self, operation: &Operation<V>) -> Reply<V> {
        self.perform(operation).unwrap_or_else(|_| Reply::failed(operation))
    }

    /// Invokes the backend with before, after, and on failure fail notifications.
    ///
    /// This is the only place backend query methods are called.
    fn perform(&mut self, operation: &Operation<V>) -> Outcome<Reply<V>> {
        let query = QueryEvent::new(operation.kind(), operation.target(), operation.is_mutable());
        self.notify(&Event::Before(query));

        let outcome = invoke(&mut self.backend, operation);
        match &outcome {
            Ok(_) => telemetry::record_execution(operation, None),
            Err(failure) => {
                telemetry::record_execution(operation, Some(failure));
                self.notify(&Event::Fail(failure));
            }
        }

        self.notify(&Event::After(query));
        outcome
    }
}

fn invoke<V, B>(backend: &mut B, operation: &Operation<V>) -> Outcome<Reply<V>>
where
    B: Backend<V>,
{
    Ok(match operation {
        Operation::Get { key } => Reply::Value(backend.get(key)?),
        Operation::GetMulti { keys } => Reply::Values(MultiValue::assemble(keys, backend.get_multi(keys)?)),
        Operation::Set { key, value, ttl } => Reply::Stored(backend.set(key, value, *ttl)?),
        Operation::Add { key, value, ttl } => Reply::Stored(backend.add(key, value, *ttl)?),
        Operation::Replace { key, value, ttl } => Reply::Stored(backend.replace(key, value, *ttl)?),
        Operation::Increment { key, amount } => Reply::Counter(backend.increment(key, *amount)?),
        Operation::Decrement { key, amount } => Reply::Counter(backend.decrement(key, *amount)?),
        Operation::Delete { key } => Reply::Stored(backend.delete(key)?),
        Operation::DeleteMulti { keys } => Reply::Stored(backend.delete_multi(keys)?),
        Operation::Flush => Reply::Stored(backend.flush()?),
        Operation::GetAllKeys => Reply::Keys(backend.all_keys()?),
        Operation::GetStats => Reply::Stats(backend.stats()?),
    })
}

#[cfg(test)]
mod tests {
    use cachebuf_backend::testing::{BackendCall, MockBackend};

    use super::*;

    fn engine() -> (Engine<i32, MockBackend<i32>>, MockBackend<i32>) {
        let mock = MockBackend::new();
        (Engine::new(mock.clone(), None), mock)
    }

    #[test]
    fn idle_execution_hits_backend_once() {
        let (mut engine, mock) = engine();
        let reply = engine
            .execute(Operation::Set {
                key: "k".to_string(),
                value: 1,
                ttl: 0,
            })
            .unwrap();

        assert_eq!(reply, Reply::Stored(true));
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn failure_yields_sentinel() {
        let (mut engine, mock) = engine();
        mock.fail_when(|_| true);

        let reply = engine.execute(Operation::Get { key: "k".to_string() }).unwrap();
        assert_eq!(reply, Reply::Value(None));
    }

    #[test]
    fn queued_operations_are_visible_until_commit() {
        let (mut engine, _mock) = engine();
        engine.begin().unwrap();
        engine.execute(Operation::Delete { key: "k".to_string() }).unwrap();
        assert_eq!(engine.buffered_operations().len(), 1);

        let report = engine.commit();
        assert_eq!(report.replayed(), 1);
        assert!(engine.buffered_operations().is_empty());
    }

    #[test]
    fn commit_counts_failures_and_continues() {
        let (mut engine, mock) = engine();
        mock.fail_when(|call| matches!(call, BackendCall::Set { key, .. } if key == "b"));

        engine.begin().unwrap();
        for key in ["a", "b", "c"] {
            engine
                .execute(Operation::Set {
                    key: key.to_string(),
                    value: 1,
                    ttl: 0,
                })
                .unwrap();
        }
        let report = engine.commit();

        assert_eq!(report, CommitReport::new(3, 1));
        assert!(mock.contains_key("a"));
        assert!(!mock.contains_key("b"));
        assert!(mock.contains_key("c"));
    }

    #[test]
    fn close_failure_reports_false() {
        let (mut engine, mock) = engine();
        mock.fail_when(|call| matches!(call, BackendCall::Close));
        assert!(!engine.close());
    }

    #[test]
    fn dispatcher_is_created_lazily() {
        let (mut engine, _mock) = engine();
        assert!(engine.dispatcher().is_none());
        let _ = engine.dispatcher_mut();
        assert!(engine.dispatcher().is_some());
    }
}
