// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cachebuf_backend::{MultiValue, ServerStats};

use crate::Operation;

/// The typed result of executing an [`Operation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reply<V> {
    Value(Option<V>),
    Values(MultiValue<V>),
    Stored(bool),
    Counter(Option<i64>),
    Keys(Vec<String>),
    Stats(Vec<ServerStats>),
    /// The mutation was added to the buffer queue.
    Queued,
}

impl<V> Reply<V> {
    /// The sentinel returned when the backend reported a failure.
    pub(crate) fn failed(operation: &Operation<V>) -> Self {
        match operation {
            Operation::Get { .. } => Self::Value(None),
            Operation::GetMulti { keys } => Self::Values(MultiValue::missing(keys)),
            Operation::Increment { .. } | Operation::Decrement { .. } => Self::Counter(None),
            Operation::GetAllKeys => Self::Keys(Vec::new()),
            Operation::GetStats => Self::Stats(Vec::new()),
            Operation::Set { .. }
            | Operation::Add { .. }
            | Operation::Replace { .. }
            | Operation::Delete { .. }
            | Operation::DeleteMulti { .. }
            | Operation::Flush => Self::Stored(false),
        }
    }

    pub(crate) fn into_value(self) -> Option<V> {
        match self {
            Self::Value(value) => value,
            _ => None,
        }
    }

    pub(crate) fn into_values(self) -> MultiValue<V> {
        match self {
            Self::Values(values) => values,
            _ => MultiValue::new(),
        }
    }

    pub(crate) fn into_stored(self) -> bool {
        match self {
            Self::Stored(stored) => stored,
            Self::Queued => true,
            _ => false,
        }
    }

    pub(crate) fn into_counter(self) -> Option<i64> {
        match self {
            Self::Counter(counter) => counter,
            _ => None,
        }
    }

    pub(crate) fn into_keys(self) -> Vec<String> {
        match self {
            Self::Keys(keys) => keys,
            _ => Vec::new(),
        }
    }

    pub(crate) fn into_stats(self) -> Vec<ServerStats> {
        match self {
            Self::Stats(stats) => stats,
            _ => Vec::new(),
        }
    }
}
