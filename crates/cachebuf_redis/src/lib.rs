// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis backend for `cachebuf`.
//!
//! [`RedisBackend`] drives a single synchronous [`redis`] connection. Values are stored
//! JSON-encoded. The connection is opened on the first command, so an unreachable
//! server shows up as a failure of that command rather than at configuration time.
//!
//! Memcache treats a TTL of `0` as "never expire". Redis has no such convention for
//! `SET ... EX`, so a zero TTL is replaced by [`PSEUDO_MAX_TTL`] (thirty days) unless a
//! different substitute is configured with [`RedisBackend::with_permanent_ttl`].
//!
//! # Examples
//!
//! ```
//! use cachebuf_backend::Backend;
//! use cachebuf_redis::RedisBackend;
//!
//! let mut backend = RedisBackend::<String>::new();
//! backend.add_server("127.0.0.1", 6379);
//! assert_eq!(backend.target().map(ToString::to_string), Some("127.0.0.1:6379".to_string()));
//! ```

mod info;

use std::{collections::HashMap, fmt, marker::PhantomData};

use cachebuf_backend::{Backend, Failure, Outcome, Server, ServerStats};
use redis::{Cmd, Connection, FromRedisValue, RedisError, Value};
use serde::{Serialize, de::DeserializeOwned};

/// TTL used in place of `0`: thirty days, in seconds.
pub const PSEUDO_MAX_TTL: u32 = 2_592_000;

const SCAN_BATCH: u32 = 1000;

/// A backend over one Redis server.
pub struct RedisBackend<V> {
    target: Option<Server>,
    connection: Option<Connection>,
    permanent_ttl: u32,
    _value: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for RedisBackend<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("target", &self.target)
            .field("connected", &self.connection.is_some())
            .field("permanent_ttl", &self.permanent_ttl)
            .finish()
    }
}

impl<V> Default for RedisBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RedisBackend<V> {
    /// Creates a backend with no server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: None,
            connection: None,
            permanent_ttl: PSEUDO_MAX_TTL,
            _value: PhantomData,
        }
    }

    /// Sets the TTL substituted for `0`.
    #[must_use]
    pub fn with_permanent_ttl(self, ttl: u32) -> Self {
        Self {
            permanent_ttl: ttl.max(1),
            ..self
        }
    }

    /// Returns the server commands are sent to.
    #[must_use]
    pub fn target(&self) -> Option<&Server> {
        self.target.as_ref()
    }

    /// Returns `true` once a connection has been opened.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Returns the TTL actually sent for a requested TTL.
    #[must_use]
    pub fn effective_ttl(&self, ttl: u32) -> u32 {
        if ttl == 0 { self.permanent_ttl } else { ttl }
    }

    fn failure(&self, error: &RedisError) -> Failure {
        let failure = Failure::new(error.to_string());
        match &self.target {
            Some(server) => failure.with_server(server.host(), server.port()),
            None => failure,
        }
    }

    /// Returns the connection, opening it on first use.
    fn connection(&mut self) -> Outcome<&mut Connection> {
        if self.connection.is_none() {
            let Some(server) = &self.target else {
                return Err(Failure::new("no redis server configured"));
            };
            tracing::debug!(cache.server = %server, "redis.connect");
            let url = format!("redis://{}:{}/", server.host(), server.port());
            let connection = redis::Client::open(url)
                .and_then(|client| client.get_connection())
                .map_err(|error| self.failure(&error))?;
            self.connection = Some(connection);
        }
        self.connection
            .as_mut()
            .ok_or_else(|| Failure::new("redis connection is not open"))
    }

    /// Sends one command, dropping the connection when it broke.
    fn query<T: FromRedisValue>(&mut self, command: &Cmd) -> Outcome<T> {
        let result = command.query::<T>(self.connection()?);
        result.map_err(|error| {
            if error.is_io_error() || error.is_connection_dropped() {
                tracing::debug!("redis.disconnect");
                self.connection = None;
            }
            self.failure(&error)
        })
    }

    fn store(&mut self, key: &str, payload: &str, ttl: u32, condition: Option<&str>) -> Outcome<bool> {
        let mut command = redis::cmd("SET");
        command.arg(key).arg(payload).arg("EX").arg(self.effective_ttl(ttl));
        if let Some(condition) = condition {
            command.arg(condition);
        }
        let reply: Value = self.query(&command)?;
        Ok(!matches!(reply, Value::Nil))
    }
}

fn encode<V: Serialize>(value: &V) -> Outcome<String> {
    serde_json::to_string(value).map_err(|error| Failure::new(format!("failed to encode value: {error}")))
}

fn decode<V: DeserializeOwned>(payload: &str) -> Outcome<V> {
    serde_json::from_str(payload).map_err(|error| Failure::new(format!("failed to decode value: {error}")))
}

impl<V> Backend<V> for RedisBackend<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Points the backend at a server; the last server added wins.
    fn add_server(&mut self, host: &str, port: u16) {
        let server = Server::new(host, port);
        tracing::debug!(cache.server = %server, "redis.add_server");
        self.target = Some(server);
        self.connection = None;
    }

    fn get(&mut self, key: &str) -> Outcome<Option<V>> {
        let payload: Option<String> = self.query(redis::cmd("GET").arg(key))?;
        payload.map(|payload| decode(&payload)).transpose()
    }

    fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, V>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let payloads: Vec<Option<String>> = self.query(redis::cmd("MGET").arg(keys.to_vec()))?;
        let mut found = HashMap::with_capacity(keys.len());
        for (key, payload) in keys.iter().zip(payloads) {
            if let Some(payload) = payload {
                found.insert(key.clone(), decode(&payload)?);
            }
        }
        Ok(found)
    }

    fn set(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.store(key, &payload, ttl, None)
    }

    fn add(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.store(key, &payload, ttl, Some("NX"))
    }

    fn replace(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.store(key, &payload, ttl, Some("XX"))
    }

    fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.query(redis::cmd("INCRBY").arg(key).arg(amount)).map(Some)
    }

    fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.query(redis::cmd("DECRBY").arg(key).arg(amount)).map(Some)
    }

    fn delete(&mut self, key: &str) -> Outcome<bool> {
        let removed: i64 = self.query(redis::cmd("DEL").arg(key))?;
        Ok(removed > 0)
    }

    fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool> {
        if keys.is_empty() {
            return Ok(true);
        }
        let _removed: i64 = self.query(redis::cmd("DEL").arg(keys.to_vec()))?;
        Ok(true)
    }

    fn flush(&mut self) -> Outcome<bool> {
        let _: Value = self.query(&redis::cmd("FLUSHDB"))?;
        Ok(true)
    }

    fn all_keys(&mut self) -> Outcome<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor = 0_u64;
        loop {
            let (next, batch): (u64, Vec<String>) =
                self.query(redis::cmd("SCAN").arg(cursor).arg("COUNT").arg(SCAN_BATCH))?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }

    fn stats(&mut self) -> Outcome<Vec<ServerStats>> {
        let raw: String = self.query(&redis::cmd("INFO"))?;
        let label = self.target.as_ref().map(ToString::to_string).unwrap_or_default();
        Ok(vec![ServerStats::new(label, info::normalize_info(info::parse_info(&raw)))])
    }

    fn close(&mut self) -> Outcome<bool> {
        if self.connection.take().is_some() {
            tracing::debug!("redis.disconnect");
        }
        Ok(true)
    }
}
