// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cachebuf_backend::{Failure, Outcome, Server};
use memcache::{MemcacheError, ServerError};

const NODE_FAILURE: &str = "Node failure";

/// How a [`MemcacheBackend`](crate::MemcacheBackend) reports unsuccessful commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemcacheFlavor {
    /// Every unsuccessful command is a failure carrying the client's message.
    ///
    /// A read that finds nothing is a miss, not a failure. Server weights are ignored.
    Memcached,
    /// Only server-level trouble is a failure.
    ///
    /// Such failures carry the reason `Node failure` and the first configured server.
    /// Rejected commands quietly report `false` or `None`, and multi-key deletes always
    /// report success. Server weights are honored.
    Memcache,
}

impl MemcacheFlavor {
    /// Builds the connection URLs, repeating weighted servers when the flavor honors weights.
    pub(crate) fn server_urls(self, servers: &[Server]) -> Vec<String> {
        servers
            .iter()
            .flat_map(|server| {
                let copies = match self {
                    Self::Memcached => 1,
                    Self::Memcache => server.weight().max(1),
                };
                let url = format!("memcache://{}:{}", server.host(), server.port());
                (0..copies).map(move |_| url.clone())
            })
            .collect()
    }

    /// Decides whether a client error is a failure or a quiet rejection.
    pub(crate) fn classify(self, first: Option<&Server>, error: &MemcacheError) -> Outcome<()> {
        match (self, error) {
            (Self::Memcache, error) if is_rejection(error) => Ok(()),
            (Self::Memcache, _) => Err(self.node_failure(first, error)),
            (Self::Memcached, MemcacheError::IOError(io)) => {
                let failure = Failure::new(error.to_string());
                Err(match io.raw_os_error() {
                    Some(code) => failure.with_code(i64::from(code)),
                    None => failure,
                })
            }
            (Self::Memcached, _) => Err(Failure::new(error.to_string())),
        }
    }

    /// Builds the failure reported when no connection could be used.
    pub(crate) fn node_failure(self, first: Option<&Server>, error: &MemcacheError) -> Failure {
        match self {
            Self::Memcached => Failure::new(error.to_string()),
            Self::Memcache => {
                let failure = Failure::new(NODE_FAILURE);
                match first {
                    Some(server) => failure.with_server(server.host(), server.port()),
                    None => failure,
                }
            }
        }
    }
}

/// Returns `true` when the server answered but refused the command.
///
/// Status codes, `CLIENT_ERROR` and `SERVER_ERROR` replies all come from a live node.
fn is_rejection(error: &MemcacheError) -> bool {
    matches!(
        error,
        MemcacheError::CommandError(_) | MemcacheError::ClientError(_) | MemcacheError::ServerError(ServerError::Error(_))
    )
}

#[cfg(test)]
mod tests {
    use std::io;

    use memcache::{ClientError, CommandError};

    use super::*;

    fn refused() -> MemcacheError {
        MemcacheError::IOError(io::Error::from_raw_os_error(111))
    }

    fn rejections() -> Vec<MemcacheError> {
        vec![
            MemcacheError::CommandError(CommandError::KeyExists),
            MemcacheError::ClientError(ClientError::from(
                "CLIENT_ERROR cannot increment or decrement non-numeric value".to_string(),
            )),
            MemcacheError::ServerError(ServerError::Error("SERVER_ERROR object too large for cache".to_string())),
        ]
    }

    #[test]
    fn memcache_rejections_are_quiet() {
        let first = Server::new("cache-1", 11211);
        for error in rejections() {
            assert_eq!(MemcacheFlavor::Memcache.classify(Some(&first), &error), Ok(()), "{error}");
        }
    }

    #[test]
    fn memcached_rejections_carry_the_client_message() {
        for error in rejections() {
            let failure = MemcacheFlavor::Memcached.classify(None, &error).unwrap_err();
            assert_eq!(failure.reason(), error.to_string());
            assert_eq!(failure.code(), None);
        }
    }

    #[test]
    fn memcache_protocol_corruption_is_node_failure() {
        let error = MemcacheError::ServerError(ServerError::BadMagic(0x42));
        let failure = MemcacheFlavor::Memcache.classify(None, &error).unwrap_err();
        assert_eq!(failure.reason(), NODE_FAILURE);
    }

    #[test]
    fn weights_repeat_urls_for_memcache_only() {
        let servers = [Server::new("a", 1).with_weight(3), Server::new("b", 2)];

        let weighted = MemcacheFlavor::Memcache.server_urls(&servers);
        assert_eq!(weighted.iter().filter(|url| *url == "memcache://a:1").count(), 3);
        assert_eq!(weighted.len(), 4);

        let plain = MemcacheFlavor::Memcached.server_urls(&servers);
        assert_eq!(plain, vec!["memcache://a:1".to_string(), "memcache://b:2".to_string()]);
    }

    #[test]
    fn memcache_io_error_is_node_failure_on_first_server() {
        let first = Server::new("cache-1", 11211);
        let failure = MemcacheFlavor::Memcache.classify(Some(&first), &refused()).unwrap_err();

        assert_eq!(failure.reason(), NODE_FAILURE);
        assert_eq!(failure.hostname(), Some("cache-1"));
        assert_eq!(failure.port(), Some(11211));
        assert_eq!(failure.code(), None);
    }

    #[test]
    fn memcached_io_error_carries_os_code() {
        let failure = MemcacheFlavor::Memcached.classify(None, &refused()).unwrap_err();

        assert_eq!(failure.code(), Some(111));
        assert_eq!(failure.hostname(), None);
        assert!(!failure.reason().is_empty());
    }
}
