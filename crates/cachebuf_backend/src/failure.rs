// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// A failed backend call with whatever metadata the client library exposed.
///
/// Failures are data rather than errors: the engine turns them into a fail notification
/// and a sentinel reply instead of propagating them to the caller.
///
/// # Examples
///
/// ```
/// use cachebuf_backend::Failure;
///
/// let failure = Failure::new("Node failure").with_server("cache-1", 11211);
/// assert_eq!(failure.reason(), "Node failure");
/// assert_eq!(failure.hostname(), Some("cache-1"));
/// assert_eq!(failure.port(), Some(11211));
/// assert_eq!(failure.code(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    reason: String,
    hostname: Option<String>,
    port: Option<u16>,
    code: Option<i64>,
}

impl Failure {
    /// Creates a failure with the given reason and no further metadata.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            hostname: None,
            port: None,
            code: None,
        }
    }

    /// Attaches the server the failure was observed on.
    #[must_use]
    pub fn with_server(self, hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: Some(hostname.into()),
            port: Some(port),
            ..self
        }
    }

    /// Attaches a client-specific status code.
    #[must_use]
    pub fn with_code(self, code: i64) -> Self {
        Self { code: Some(code), ..self }
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the hostname of the failing server, when known.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Returns the port of the failing server, when known.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the client status code, when known.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.code
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)?;
        if let (Some(host), Some(port)) = (&self.hostname, self.port) {
            write!(f, " ({host}:{port})")?;
        }
        if let Some(code) = self.code {
            write!(f, " [code {code}]")?;
        }
        Ok(())
    }
}
