// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use cachebuf_backend::{Backend, Outcome, Server, ServerStats};
#[cfg(feature = "memcache")]
use cachebuf_memcache::{MemcacheBackend, MemcacheFlavor};
#[cfg(feature = "redis")]
use cachebuf_redis::RedisBackend;
use serde::{Serialize, de::DeserializeOwned};

#[cfg(not(all(feature = "memcache", feature = "redis")))]
use crate::{Error, ErrorKind};
use crate::{BackendType, Result};

/// One of the backends compiled into this build.
///
/// The set of variants is fixed at compile time by the `memcache` and `redis` features.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBackend<V> {
    /// A memcache or memcached pool.
    #[cfg(feature = "memcache")]
    Memcache(MemcacheBackend<V>),
    /// A Redis connection.
    #[cfg(feature = "redis")]
    Redis(RedisBackend<V>),
}

impl<V> AnyBackend<V> {
    /// Creates an unconnected backend of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SystemRequirement`](crate::ErrorKind::SystemRequirement) when
    /// the type was not compiled in.
    pub fn for_type(backend_type: BackendType) -> Result<Self> {
        match backend_type {
            BackendType::Memcached | BackendType::Memcache => Self::memcache(backend_type),
            BackendType::Redis => Self::redis(),
        }
    }

    #[cfg(feature = "memcache")]
    #[expect(clippy::unnecessary_wraps, reason = "mirrors the fallible variant built without the feature")]
    fn memcache(backend_type: BackendType) -> Result<Self> {
        let flavor = if backend_type == BackendType::Memcache {
            MemcacheFlavor::Memcache
        } else {
            MemcacheFlavor::Memcached
        };
        Ok(Self::Memcache(MemcacheBackend::new(flavor)))
    }

    #[cfg(not(feature = "memcache"))]
    fn memcache(backend_type: BackendType) -> Result<Self> {
        Err(unavailable(backend_type))
    }

    #[cfg(feature = "redis")]
    #[expect(clippy::unnecessary_wraps, reason = "mirrors the fallible variant built without the feature")]
    fn redis() -> Result<Self> {
        Ok(Self::Redis(RedisBackend::new()))
    }

    #[cfg(not(feature = "redis"))]
    fn redis() -> Result<Self> {
        Err(unavailable(BackendType::Redis))
    }

    /// Returns the backend type this value was built for.
    #[must_use]
    pub fn backend_type(&self) -> BackendType {
        match self {
            #[cfg(feature = "memcache")]
            Self::Memcache(backend) => match backend.flavor() {
                MemcacheFlavor::Memcache => BackendType::Memcache,
                MemcacheFlavor::Memcached => BackendType::Memcached,
            },
            #[cfg(feature = "redis")]
            Self::Redis(_) => BackendType::Redis,
        }
    }
}

#[cfg(not(all(feature = "memcache", feature = "redis")))]
fn unavailable(backend_type: BackendType) -> crate::Error {
    Error::caused_by(
        ErrorKind::SystemRequirement,
        format!("{backend_type} support is not available in this build"),
    )
}

macro_rules! delegate {
    ($self:ident, $backend:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memcache")]
            Self::Memcache($backend) => $call,
            #[cfg(feature = "redis")]
            Self::Redis($backend) => $call,
        }
    };
}

impl<V> Backend<V> for AnyBackend<V>
where
    V: Serialize + DeserializeOwned,
{
    fn add_server(&mut self, host: &str, port: u16) {
        delegate!(self, backend => backend.add_server(host, port));
    }

    fn add_servers(&mut self, servers: &[Server]) {
        delegate!(self, backend => backend.add_servers(servers));
    }

    fn get(&mut self, key: &str) -> Outcome<Option<V>> {
        delegate!(self, backend => backend.get(key))
    }

    fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, V>> {
        delegate!(self, backend => backend.get_multi(keys))
    }

    fn set(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        delegate!(self, backend => backend.set(key, value, ttl))
    }

    fn add(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        delegate!(self, backend => backend.add(key, value, ttl))
    }

    fn replace(&mut self, key: &str, value: &V, ttl: u32) -> Outcome<bool> {
        delegate!(self, backend => backend.replace(key, value, ttl))
    }

    fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        delegate!(self, backend => backend.increment(key, amount))
    }

    fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
        delegate!(self, backend => backend.decrement(key, amount))
    }

    fn delete(&mut self, key: &str) -> Outcome<bool> {
        delegate!(self, backend => backend.delete(key))
    }

    fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool> {
        delegate!(self, backend => backend.delete_multi(keys))
    }

    fn flush(&mut self) -> Outcome<bool> {
        delegate!(self, backend => backend.flush())
    }

    fn all_keys(&mut self) -> Outcome<Vec<String>> {
        delegate!(self, backend => backend.all_keys())
    }

    fn stats(&mut self) -> Outcome<Vec<ServerStats>> {
        delegate!(self, backend => backend.stats())
    }

    fn close(&mut self) -> Outcome<bool> {
        delegate!(self, backend => backend.close())
    }
}

#[cfg(all(test, feature = "memcache", feature = "redis"))]
mod tests {
    use super::*;

    #[test]
    fn for_type_maps_flavors() {
        for backend_type in BackendType::ALL {
            let backend = AnyBackend::<i32>::for_type(backend_type).unwrap();
            assert_eq!(backend.backend_type(), backend_type);
        }
    }
}
