// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

/// Statistics reported by one server of a pool.
///
/// Values are kept as the server reported them; numeric interpretation is left to the
/// caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerStats {
    server: String,
    values: BTreeMap<String, String>,
}

impl ServerStats {
    /// Creates a stats snapshot for the named server.
    #[must_use]
    pub fn new(server: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        Self {
            server: server.into(),
            values,
        }
    }

    /// Returns the server label, usually `host:port`.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns a single statistic.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns all statistics, sorted by name.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl<S, I, K, V> From<(S, I)> for ServerStats
where
    S: Into<String>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    fn from((server, values): (S, I)) -> Self {
        Self::new(server, values.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
