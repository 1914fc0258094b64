// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Server list configuration.

use cachebuf_backend::{DEFAULT_WEIGHT, Server};
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, Result};

/// One server entry as it appears in configuration.
///
/// Fields are optional so incomplete records can be deserialized and then rejected by
/// [`ConfigService`] with a message naming what is missing.
///
/// # Examples
///
/// ```
/// use cachebuf::ServerConfig;
///
/// let config = ServerConfig::new("127.0.0.1", 11211).with_weight(2);
/// assert_eq!(config.host.as_deref(), Some("127.0.0.1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ServerConfig {
    /// Host name or address.
    pub host: Option<String>,
    /// TCP port.
    pub port: Option<u16>,
    /// Relative pool weight; only the memcache backend honors it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl ServerConfig {
    /// Creates a complete record.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            weight: None,
        }
    }

    /// Sets the pool weight.
    #[must_use]
    pub fn with_weight(self, weight: u32) -> Self {
        Self {
            weight: Some(weight),
            ..self
        }
    }
}

/// Validates server records and holds the resulting pool.
#[derive(Clone, Debug, Default)]
pub struct ConfigService {
    servers: Vec<Server>,
}

impl ConfigService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a list of records.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigRequirement`] for the first incomplete record.
    pub fn from_configs(configs: &[ServerConfig]) -> Result<Self> {
        let mut service = Self::new();
        service.add_server_configs(configs)?;
        Ok(service)
    }

    /// Validates and stores one record.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigRequirement`] naming the missing fields when `host` or
    /// `port` is absent.
    pub fn add_server_config(&mut self, config: &ServerConfig) -> Result<()> {
        let (Some(host), Some(port)) = (&config.host, config.port) else {
            let missing: Vec<_> = [("host", config.host.is_none()), ("port", config.port.is_none())]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
            return Err(Error::caused_by(
                ErrorKind::ConfigRequirement,
                format!("Missing: {}", missing.join(", ")),
            ));
        };

        self.servers
            .push(Server::new(host.as_str(), port).with_weight(config.weight.unwrap_or(DEFAULT_WEIGHT)));
        Ok(())
    }

    /// Validates and stores several records, stopping at the first incomplete one.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigRequirement`] for the first incomplete record.
    pub fn add_server_configs(&mut self, configs: &[ServerConfig]) -> Result<()> {
        configs.iter().try_for_each(|config| self.add_server_config(config))
    }

    /// Returns the validated servers.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigRequirement`] when no server was added.
    pub fn servers(&self) -> Result<&[Server]> {
        if self.servers.is_empty() {
            return Err(Error::caused_by(
                ErrorKind::ConfigRequirement,
                "No server configurations, add at least one server first",
            ));
        }
        Ok(&self.servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_defaults_to_one() {
        let service = ConfigService::from_configs(&[ServerConfig::new("h", 1)]).unwrap();
        assert_eq!(service.servers().unwrap()[0].weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn missing_both_fields_names_both_in_order() {
        let error = ConfigService::new().add_server_config(&ServerConfig::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ConfigRequirement);
        assert!(error.to_string().contains("Missing: host, port"), "got: {error}");
    }
}
