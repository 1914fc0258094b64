// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for adapter construction and the buffering protocol.

use std::fmt;

/// The category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// `begin_buffer` was called while a buffering session was already active.
    DuplicateAction,
    /// The operation cannot run while buffering is active.
    OperationNotSupported,
    /// A server configuration record is incomplete.
    ConfigRequirement,
    /// The requested backend was not compiled into this build.
    SystemRequirement,
    /// A backend was requested by a name that does not exist.
    InvalidBackend,
}

impl ErrorKind {
    /// Returns the name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateAction => "DuplicateAction",
            Self::OperationNotSupported => "OperationNotSupported",
            Self::ConfigRequirement => "ConfigRequirement",
            Self::SystemRequirement => "SystemRequirement",
            Self::InvalidBackend => "InvalidBackend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised synchronously to the caller.
///
/// These errors signal programmer mistakes: a bad configuration, an unavailable backend,
/// or a misuse of the buffering protocol. Backend trouble never surfaces as an `Error`;
/// it is reported through fail notifications instead.
///
/// # Example
///
/// ```
/// use cachebuf::{Adapter, ErrorKind};
/// use cachebuf_backend::testing::MockBackend;
///
/// let mut cache = Adapter::new(MockBackend::<i32>::new());
/// cache.begin_buffer()?;
///
/// let error = cache.begin_buffer().unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::DuplicateAction);
/// # Ok::<(), cachebuf::Error>(())
/// ```
#[ohno::error]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for cachebuf operations.
pub type Result<T> = std::result::Result<T, Error>;
