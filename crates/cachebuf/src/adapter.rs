// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The operation dispatch façade.

use cachebuf_backend::{Backend, DEFAULT_TTL, MultiValue, Server, ServerStats};

use crate::{
    EventDispatcher, EventKind, Operation, Result,
    buffer::CommitReport,
    engine::Engine,
    events::Event,
};

/// A cache client over one backend, with optional write-behind buffering.
///
/// Each method packages its arguments into an [`Operation`] and hands it to the engine.
/// Outside a buffering session every call reaches the backend exactly once. Inside one,
/// sets and deletes are queued and mirrored in a local shadow so later reads see them,
/// until [`commit_buffer`](Self::commit_buffer) replays the queue in order or
/// [`rollback_buffer`](Self::rollback_buffer) discards it.
///
/// Backend trouble never surfaces as an error. The affected call returns its sentinel
/// (`None`, `false`, or an empty collection) and a [`Fail`](EventKind::Fail) event is
/// dispatched. Methods only return [`Error`](crate::Error) when the buffering protocol
/// is misused.
///
/// # Examples
///
/// ```
/// use cachebuf::Adapter;
/// use cachebuf_backend::testing::MockBackend;
///
/// # fn main() -> cachebuf::Result<()> {
/// let mut cache = Adapter::new(MockBackend::<i32>::new());
///
/// cache.begin_buffer()?;
/// cache.set("answer", 42)?;
/// assert_eq!(cache.get("answer")?, Some(42));
///
/// let report = cache.commit_buffer();
/// assert_eq!(report.replayed(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Adapter<V, B> {
    engine: Engine<V, B>,
}

impl<V, B> Adapter<V, B>
where
    B: Backend<V>,
{
    /// Creates an adapter; the event dispatcher is built on the first [`bind`](Self::bind).
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            engine: Engine::new(backend, None),
        }
    }

    /// Creates an adapter that reports to an existing dispatcher.
    #[must_use]
    pub fn with_dispatcher(backend: B, dispatcher: EventDispatcher) -> Self {
        Self {
            engine: Engine::new(backend, Some(dispatcher)),
        }
    }
}

impl<V, B> Adapter<V, B> {
    /// Registers a handler for one kind of query event.
    pub fn bind<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.engine.dispatcher_mut().add_listener(kind, handler);
    }

    /// Returns the event dispatcher, if one was injected or bound.
    #[must_use]
    pub fn dispatcher(&self) -> Option<&EventDispatcher> {
        self.engine.dispatcher()
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        self.engine.backend()
    }

    /// Starts a buffering session.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateAction`](crate::ErrorKind::DuplicateAction) if a
    /// session is already active; the active session is left untouched.
    pub fn begin_buffer(&mut self) -> Result<()> {
        self.engine.begin()
    }

    /// Discards the active buffering session without touching the backend.
    ///
    /// Does nothing when no session is active.
    pub fn rollback_buffer(&mut self) {
        self.engine.rollback();
    }

    /// Returns `true` while a buffering session is active.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.engine.is_buffering()
    }

    /// Returns the queued operations in issue order, empty when not buffering.
    #[must_use]
    pub fn buffered_operations(&self) -> &[Operation<V>] {
        self.engine.buffered_operations()
    }
}

impl<V, B> Adapter<V, B>
where
    V: Clone,
    B: Backend<V>,
{
    /// Registers a server with the backend.
    pub fn add_server(&mut self, host: &str, port: u16) {
        self.engine.backend_mut().add_server(host, port);
    }

    /// Registers several servers with the backend.
    pub fn add_servers(&mut self, servers: &[Server]) {
        self.engine.backend_mut().add_servers(servers);
    }

    /// Reads one key, `None` when it is absent.
    ///
    /// # Errors
    ///
    /// Never fails; reads are allowed in every state.
    pub fn get(&mut self, key: impl Into<String>) -> Result<Option<V>> {
        Ok(self.engine.execute(Operation::Get { key: key.into() })?.into_value())
    }

    /// Reads several keys.
    ///
    /// The result holds every requested key in request order; absent keys map to `None`.
    ///
    /// # Errors
    ///
    /// Never fails; reads are allowed in every state.
    pub fn get_multi<I>(&mut self, keys: I) -> Result<MultiValue<V>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        Ok(self.engine.execute(Operation::GetMulti { keys })?.into_values())
    }

    /// Stores a value with the default two-week TTL.
    ///
    /// # Errors
    ///
    /// Never fails; sets are queued while buffering.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Result<bool> {
        self.set_with_ttl(key, value, DEFAULT_TTL)
    }

    /// Stores a value; a `ttl` of `0` means no expiration.
    ///
    /// # Errors
    ///
    /// Never fails; sets are queued while buffering.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: u32) -> Result<bool> {
        let operation = Operation::Set {
            key: key.into(),
            value,
            ttl,
        };
        Ok(self.engine.execute(operation)?.into_stored())
    }

    /// Stores a value if the key is absent, with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn add(&mut self, key: impl Into<String>, value: V) -> Result<bool> {
        self.add_with_ttl(key, value, DEFAULT_TTL)
    }

    /// Stores a value if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn add_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: u32) -> Result<bool> {
        let operation = Operation::Add {
            key: key.into(),
            value,
            ttl,
        };
        Ok(self.engine.execute(operation)?.into_stored())
    }

    /// Stores a value if the key is present, with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn replace(&mut self, key: impl Into<String>, value: V) -> Result<bool> {
        self.replace_with_ttl(key, value, DEFAULT_TTL)
    }

    /// Stores a value if the key is present.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn replace_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: u32) -> Result<bool> {
        let operation = Operation::Replace {
            key: key.into(),
            value,
            ttl,
        };
        Ok(self.engine.execute(operation)?.into_stored())
    }

    /// Increments a counter by one.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn increment(&mut self, key: impl Into<String>) -> Result<Option<i64>> {
        self.increment_by(key, 1)
    }

    /// Increments a counter, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn increment_by(&mut self, key: impl Into<String>, amount: u64) -> Result<Option<i64>> {
        let operation = Operation::Increment { key: key.into(), amount };
        Ok(self.engine.execute(operation)?.into_counter())
    }

    /// Decrements a counter by one.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn decrement(&mut self, key: impl Into<String>) -> Result<Option<i64>> {
        self.decrement_by(key, 1)
    }

    /// Decrements a counter, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn decrement_by(&mut self, key: impl Into<String>, amount: u64) -> Result<Option<i64>> {
        let operation = Operation::Decrement { key: key.into(), amount };
        Ok(self.engine.execute(operation)?.into_counter())
    }

    /// Removes one key.
    ///
    /// # Errors
    ///
    /// Never fails; deletes are queued while buffering.
    pub fn delete(&mut self, key: impl Into<String>) -> Result<bool> {
        Ok(self.engine.execute(Operation::Delete { key: key.into() })?.into_stored())
    }

    /// Removes several keys.
    ///
    /// # Errors
    ///
    /// Never fails; deletes are queued while buffering.
    pub fn delete_multi<I>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        Ok(self.engine.execute(Operation::DeleteMulti { keys })?.into_stored())
    }

    /// Invalidates every key in the pool.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn flush(&mut self) -> Result<bool> {
        Ok(self.engine.execute(Operation::Flush)?.into_stored())
    }

    /// Lists every key in the pool. Intended for development use only.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn all_keys(&mut self) -> Result<Vec<String>> {
        Ok(self.engine.execute(Operation::GetAllKeys)?.into_keys())
    }

    /// Fetches statistics for every server.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OperationNotSupported`](crate::ErrorKind::OperationNotSupported)
    /// while buffering.
    pub fn stats(&mut self) -> Result<Vec<ServerStats>> {
        Ok(self.engine.execute(Operation::GetStats)?.into_stats())
    }

    /// Replays the queued operations in issue order and leaves buffering mode.
    ///
    /// Each replayed operation emits its own query events; failures are reported and the
    /// replay continues. Returns an empty report when no session is active.
    pub fn commit_buffer(&mut self) -> CommitReport {
        self.engine.commit()
    }

    /// Disconnects from every server.
    ///
    /// Not buffered and emits no query events.
    pub fn close(&mut self) -> bool {
        self.engine.close()
    }
}
