// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Weight given to a server when none is configured.
pub const DEFAULT_WEIGHT: u32 = 1;

/// A validated cache server address.
///
/// # Examples
///
/// ```
/// use cachebuf_backend::Server;
///
/// let server = Server::new("127.0.0.1", 11211).with_weight(3);
/// assert_eq!(server.to_string(), "127.0.0.1:11211");
/// assert_eq!(server.weight(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Server {
    host: String,
    port: u16,
    weight: u32,
}

impl Server {
    /// Creates a server record with the default weight.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Sets the relative share of keys this server should receive.
    ///
    /// Only backends with weighted pools honor it; a weight of zero is treated as one.
    #[must_use]
    pub fn with_weight(self, weight: u32) -> Self {
        Self {
            weight: weight.max(1),
            ..self
        }
    }

    /// Returns the host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the pool weight.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
