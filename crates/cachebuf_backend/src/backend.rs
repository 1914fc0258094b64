// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache server backends.
//!
//! [`Backend`] defines one method per cache verb. Every method reports either a value
//! or a [`Failure`]; backends never panic or retry on behalf of the caller.

use std::collections::HashMap;

use crate::{Failure, Server, ServerStats};

/// Default time-to-live for stored values: two weeks, in seconds.
pub const DEFAULT_TTL: u32 = 1_209_600;

/// TTL value meaning "never expire".
///
/// Backends receive it verbatim and may translate it into their own notion of a
/// permanent entry.
pub const NEVER_EXPIRE: u32 = 0;

/// The result of a single backend call.
pub type Outcome<T> = Result<T, Failure>;

/// Trait for cache server backends.
///
/// Implement this trait to connect a cache client library to the buffering engine. Each
/// method maps to one cache verb and must report success or failure for that single call:
/// connection trouble, protocol errors, and rejected commands that the client signals as
/// errors are returned as [`Failure`]s so the engine can notify observers.
///
/// Only [`add_servers`](Backend::add_servers) has a default implementation, which calls
/// [`add_server`](Backend::add_server) for every entry.
pub trait Backend<V> {
    /// Registers a server with the backend's pool.
    ///
    /// Connections may be established lazily; connection errors surface on the first
    /// operation rather than here.
    fn add_server(&mut self, host: &str, port: u16);

    /// Registers several servers.
    fn add_servers(&mut self, servers: &[Server]) {
        for server in servers {
            self.add_server(server.host(), server.port());
        }
    }

    /// Fetches one value, `None` when the key is absent.
    fn get(&mut self, key: &str) -> Outcome<Option<V>>;

    /// Fetches several values.
    ///
    /// The returned map holds a subset of the requested keys in no particular order.
    /// Absent keys may be omitted entirely.
    fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, V>>;

    /// Stores a value unconditionally.
    fn set(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool>;

    /// Stores a value only if the key does not exist yet.
    fn add(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool>;

    /// Stores a value only if the key already exists.
    fn replace(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool>;

    /// Increments a counter, returning its new value.
    fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>>;

    /// Decrements a counter, returning its new value.
    fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>>;

    /// Removes one key.
    fn delete(&mut self, key: &str) -> Outcome<bool>;

    /// Removes several keys.
    fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool>;

    /// Invalidates the whole pool.
    fn flush(&mut self) -> Outcome<bool>;

    /// Lists the keys held by the pool. Intended for development use only.
    fn all_keys(&mut self) -> Outcome<Vec<String>>;

    /// Returns per-server statistics.
    fn stats(&mut self) -> Outcome<Vec<ServerStats>>;

    /// Disconnects from all servers.
    fn close(&mut self) -> Outcome<bool>;
}
