// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Memcache and memcached backend for `cachebuf`.
//!
//! [`MemcacheBackend`] passes every cache verb straight to a [`memcache`] client pool.
//! Values are stored JSON-encoded, so numbers written with `set` can be incremented by
//! the server. The connection is opened on the first operation and reopened after the
//! server list changes.
//!
//! Two [`MemcacheFlavor`]s reproduce the failure reporting of the two classic client
//! libraries. The memcached flavor reports every unsuccessful command, while the memcache
//! flavor only reports trouble with the servers themselves.
//!
//! # Examples
//!
//! ```
//! use cachebuf_backend::Backend;
//! use cachebuf_memcache::{MemcacheBackend, MemcacheFlavor};
//!
//! let mut backend = MemcacheBackend::<String>::new(MemcacheFlavor::Memcached);
//! backend.add_server("127.0.0.1", 11211);
//! assert_eq!(backend.servers().len(), 1);
//! ```

mod flavor;

use std::{collections::HashMap, fmt, marker::PhantomData};

use cachebuf_backend::{Backend, Failure, Outcome, Server, ServerStats};
#[doc(inline)]
pub use flavor::MemcacheFlavor;
use memcache::{Client, MemcacheError};
use serde::{Serialize, de::DeserializeOwned};

const ALL_KEYS_UNSUPPORTED: &str = "getAllKeys is not supported by the memcache client";

/// A backend over a pool of memcache servers.
pub struct MemcacheBackend<V> {
    flavor: MemcacheFlavor,
    servers: Vec<Server>,
    client: Option<Client>,
    _value: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for MemcacheBackend<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemcacheBackend")
            .field("flavor", &self.flavor)
            .field("servers", &self.servers)
            .field("connected", &self.client.is_some())
            .finish()
    }
}

impl<V> MemcacheBackend<V> {
    /// Creates a backend with no servers.
    #[must_use]
    pub fn new(flavor: MemcacheFlavor) -> Self {
        Self {
            flavor,
            servers: Vec::new(),
            client: None,
            _value: PhantomData,
        }
    }

    /// Returns the failure reporting flavor.
    #[must_use]
    pub fn flavor(&self) -> MemcacheFlavor {
        self.flavor
    }

    /// Returns the configured servers in registration order.
    #[must_use]
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Returns `true` once a connection has been opened.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn register(&mut self, server: Server) {
        tracing::debug!(cache.server = %server, cache.weight = server.weight(), "memcache.add_server");
        self.servers.push(server);
        self.client = None;
    }

    /// Returns the client, connecting on first use.
    fn client(&mut self) -> Outcome<&Client> {
        if self.client.is_none() {
            if self.servers.is_empty() {
                return Err(Failure::new("no memcache servers configured"));
            }
            let urls = self.flavor.server_urls(&self.servers);
            tracing::debug!(cache.servers = urls.len(), "memcache.connect");
            let connected = Client::connect(urls).map_err(|error| self.flavor.node_failure(self.servers.first(), &error))?;
            self.client = Some(connected);
        }
        self.client
            .as_ref()
            .ok_or_else(|| Failure::new("memcache client is not connected"))
    }

    /// Runs one client command and applies the flavor's failure rules.
    ///
    /// Commands the flavor treats as quiet rejections yield `rejected`.
    fn command<T>(&mut self, rejected: T, command: impl FnOnce(&Client) -> Result<T, MemcacheError>) -> Outcome<T> {
        let error = match command(self.client()?) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if matches!(error, MemcacheError::IOError(_)) {
            tracing::debug!("memcache.disconnect");
            self.client = None;
        }
        self.flavor.classify(self.servers.first(), &error).map(|()| rejected)
    }
}

fn encode<V: Serialize>(value: &V) -> Outcome<String> {
    serde_json::to_string(value).map_err(|error| Failure::new(format!("failed to encode value: {error}")))
}

fn decode<V: DeserializeOwned>(payload: &str) -> Outcome<V> {
    serde_json::from_str(payload).map_err(|error| Failure::new(format!("failed to decode value: {error}")))
}

impl<V> Backend<V> for MemcacheBackend<V>
where
    V: Serialize + DeserializeOwned,
{
    fn add_server(&mut self, host: &str, port: u16) {
        self.register(Server::new(host, port));
    }

    fn add_servers(&mut self, servers: &[Server]) {
        for server in servers {
            self.register(server.clone());
        }
    }

    fn get(&mut self, key: &str) -> Outcome<Option<V>> {
        self.command(None, |client| client.get::<String>(key))?
            .map(|payload| decode(&payload))
            .transpose()
    }

    fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, V>> {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let payloads = self.command(HashMap::new(), |client| client.gets::<String>(&keys))?;
        let mut found = HashMap::with_capacity(payloads.len());
        for (key, payload) in payloads {
            found.insert(key, decode(&payload)?);
        }
        Ok(found)
    }

    fn set(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.command(false, |client| client.set(key, payload.as_str(), ttl).map(|()| true))
    }

    fn add(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.command(false, |client| client.add(key, payload.as_str(), ttl).map(|()| true))
    }

    fn replace(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        let payload = encode(value)?;
        self.command(false, |client| client.replace(key, payload.as_str(), ttl).map(|()| true))
    }

    fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.command(None, |client| client.increment(key, amount).map(|value| i64::try_from(value).ok()))
    }

    fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        self.command(None, |client| client.decrement(key, amount).map(|value| i64::try_from(value).ok()))
    }

    fn delete(&mut self, key: &str) -> Outcome<bool> {
        self.command(false, |client| client.delete(key))
    }

    fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool> {
        let mut all_deleted = true;
        for key in keys {
            all_deleted &= self.delete(key)?;
        }
        Ok(match self.flavor {
            MemcacheFlavor::Memcached => all_deleted,
            MemcacheFlavor::Memcache => true,
        })
    }

    fn flush(&mut self) -> Outcome<bool> {
        self.command(false, |client| client.flush().map(|()| true))
    }

    fn all_keys(&mut self) -> Outcome<Vec<String>> {
        Err(Failure::new(ALL_KEYS_UNSUPPORTED))
    }

    fn stats(&mut self) -> Outcome<Vec<ServerStats>> {
        let stats = self.command(Vec::new(), Client::stats)?;
        Ok(stats.into_iter().map(ServerStats::from).collect())
    }

    fn close(&mut self) -> Outcome<bool> {
        if self.client.take().is_some() {
            tracing::debug!("memcache.disconnect");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    #[traced_test]
    fn adding_servers_is_logged() {
        let mut backend = MemcacheBackend::<i32>::new(MemcacheFlavor::Memcache);
        backend.add_server("cache-1", 11211);
        assert!(logs_contain("memcache.add_server"));
        assert!(logs_contain("cache-1:11211"));
    }

    #[test]
    fn operations_without_servers_fail() {
        let mut backend = MemcacheBackend::<i32>::new(MemcacheFlavor::Memcache);
        let failure = backend.get("k").unwrap_err();
        assert_eq!(failure.reason(), "no memcache servers configured");
        assert!(!backend.is_connected());
    }

    #[test]
    fn all_keys_is_unsupported() {
        for flavor in [MemcacheFlavor::Memcache, MemcacheFlavor::Memcached] {
            let mut backend = MemcacheBackend::<i32>::new(flavor);
            backend.add_server("127.0.0.1", 11211);
            assert_eq!(backend.all_keys().unwrap_err().reason(), ALL_KEYS_UNSUPPORTED);
        }
    }

    #[test]
    fn servers_keep_weights() {
        let mut backend = MemcacheBackend::<i32>::new(MemcacheFlavor::Memcache);
        backend.add_servers(&[Server::new("a", 1).with_weight(2), Server::new("b", 2)]);
        assert_eq!(backend.servers()[0].weight(), 2);
        assert_eq!(backend.servers().len(), 2);
    }

    #[test]
    fn close_without_connection_succeeds() {
        let mut backend = MemcacheBackend::<i32>::new(MemcacheFlavor::Memcached);
        assert_eq!(backend.close(), Ok(true));
    }

    #[test]
    fn values_round_trip_as_json() {
        let payload = encode(&vec![1, 2, 3]).unwrap();
        assert_eq!(payload, "[1,2,3]");
        assert_eq!(decode::<Vec<i32>>(&payload).unwrap(), vec![1, 2, 3]);
        assert!(decode::<i32>("not json").unwrap_err().reason().starts_with("failed to decode value"));
    }
}
