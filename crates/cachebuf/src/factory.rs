// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Backend selection and adapter construction.

use std::{fmt, str::FromStr};

#[cfg(any(feature = "memcache", feature = "redis"))]
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, ErrorKind, Result};
#[cfg(any(feature = "memcache", feature = "redis"))]
use crate::{Adapter, AnyBackend, ConfigService, EventDispatcher, ServerConfig};

/// The backends this crate can drive, in order of preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendType {
    /// The modern memcached client flavor.
    Memcached,
    /// The legacy memcache client flavor.
    Memcache,
    /// Redis.
    Redis,
}

impl BackendType {
    /// Every backend type, most preferred first.
    pub const ALL: [Self; 3] = [Self::Memcached, Self::Memcache, Self::Redis];

    /// Returns the backend name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memcached => "Memcached",
            Self::Memcache => "Memcache",
            Self::Redis => "Redis",
        }
    }

    /// Returns `true` if support for this backend was compiled in.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Memcached | Self::Memcache => cfg!(feature = "memcache"),
            Self::Redis => cfg!(feature = "redis"),
        }
    }

    /// Resolves which backend to use.
    ///
    /// An explicit request must be available. Without one, the first available backend
    /// in preference order is chosen.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SystemRequirement`] when the requested backend, or every
    /// backend, is unavailable.
    pub fn select(requested: Option<Self>) -> Result<Self> {
        select_from(requested, Self::is_available)
    }
}

pub(crate) fn select_from(requested: Option<BackendType>, available: impl Fn(BackendType) -> bool) -> Result<BackendType> {
    match requested {
        Some(backend_type) if available(backend_type) => Ok(backend_type),
        Some(backend_type) => Err(Error::caused_by(
            ErrorKind::SystemRequirement,
            format!("{backend_type} support is not available in this build"),
        )),
        None => BackendType::ALL
            .into_iter()
            .find(|backend_type| available(*backend_type))
            .ok_or_else(|| Error::caused_by(ErrorKind::SystemRequirement, "no cache backend is available in this build")),
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|backend_type| backend_type.as_str() == name)
            .ok_or_else(|| Error::caused_by(ErrorKind::InvalidBackend, format!("unknown cache backend: {name}")))
    }
}

/// Builds an [`Adapter`] from server configuration.
///
/// # Examples
///
/// ```
/// use cachebuf::{BackendType, Factory, ServerConfig};
///
/// # fn main() -> cachebuf::Result<()> {
/// let cache = Factory::new()
///     .server(ServerConfig::new("127.0.0.1", 6379))
///     .backend_type(BackendType::Redis)
///     .build::<String>()?;
/// assert!(!cache.is_buffering());
/// # Ok(())
/// # }
/// ```
#[cfg(any(feature = "memcache", feature = "redis"))]
#[derive(Debug, Default)]
pub struct Factory {
    configs: Vec<ServerConfig>,
    backend_type: Option<BackendType>,
    dispatcher: Option<EventDispatcher>,
}

#[cfg(any(feature = "memcache", feature = "redis"))]
impl Factory {
    /// Creates a factory with no servers and automatic backend selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration, selects a backend, and connects it to the servers.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigRequirement`] for incomplete or empty server lists and
    /// [`ErrorKind::SystemRequirement`] when the backend is unavailable.
    pub fn create<V>(
        configs: &[ServerConfig],
        backend_type: Option<BackendType>,
        dispatcher: Option<EventDispatcher>,
    ) -> Result<Adapter<V, AnyBackend<V>>>
    where
        V: Clone + Serialize + DeserializeOwned,
    {
        let service = ConfigService::from_configs(configs)?;
        let servers = service.servers()?;
        let backend_type = BackendType::select(backend_type)?;

        let backend = AnyBackend::for_type(backend_type)?;
        let mut adapter = match dispatcher {
            Some(dispatcher) => Adapter::with_dispatcher(backend, dispatcher),
            None => Adapter::new(backend),
        };
        adapter.add_servers(servers);

        tracing::debug!(cache.backend = backend_type.as_str(), cache.servers = servers.len(), "cache.create");
        Ok(adapter)
    }

    /// Adds one server record.
    #[must_use]
    pub fn server(mut self, config: ServerConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Adds several server records.
    #[must_use]
    pub fn servers(mut self, configs: impl IntoIterator<Item = ServerConfig>) -> Self {
        self.configs.extend(configs);
        self
    }

    /// Requests a specific backend instead of the first available one.
    #[must_use]
    pub fn backend_type(self, backend_type: BackendType) -> Self {
        Self {
            backend_type: Some(backend_type),
            ..self
        }
    }

    /// Reports query events to an existing dispatcher.
    #[must_use]
    pub fn dispatcher(self, dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..self
        }
    }

    /// Builds the adapter.
    ///
    /// # Errors
    ///
    /// See [`Factory::create`].
    pub fn build<V>(self) -> Result<Adapter<V, AnyBackend<V>>>
    where
        V: Clone + Serialize + DeserializeOwned,
    {
        Self::create(&self.configs, self.backend_type, self.dispatcher)
    }
}
