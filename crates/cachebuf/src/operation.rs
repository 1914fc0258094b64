// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Operation descriptors.
//!
//! Every façade call is turned into an [`Operation`] before it reaches the engine. The
//! descriptor is plain data, so a buffering session can queue it, expose it for
//! inspection, and replay it later through the same interpreter that runs direct calls.

use std::fmt;

/// The verb of a cache operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Single-key read.
    Get,
    /// Multi-key read.
    GetMulti,
    /// Unconditional store.
    Set,
    /// Store-if-absent.
    Add,
    /// Store-if-present.
    Replace,
    /// Counter increment.
    Increment,
    /// Counter decrement.
    Decrement,
    /// Single-key removal.
    Delete,
    /// Multi-key removal.
    DeleteMulti,
    /// Pool-wide invalidation.
    Flush,
    /// Key listing.
    GetAllKeys,
    /// Server statistics.
    GetStats,
}

impl OperationKind {
    /// Returns the operation name reported in query events and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetMulti => "getMulti",
            Self::Set => "set",
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Delete => "delete",
            Self::DeleteMulti => "deleteMulti",
            Self::Flush => "flush",
            Self::GetAllKeys => "getAllKeys",
            Self::GetStats => "getStats",
        }
    }

    /// Returns `true` if replaying the operation changes backend state.
    ///
    /// `Flush` reports `false`: it is never queued, so it is not treated as a
    /// mutation of the buffer.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        matches!(
            self,
            Self::Set | Self::Add | Self::Replace | Self::Increment | Self::Decrement | Self::Delete | Self::DeleteMulti
        )
    }

    /// Returns `true` if the operation may run while a buffering session is active.
    #[must_use]
    pub fn is_bufferable(self) -> bool {
        matches!(self, Self::Get | Self::GetMulti | Self::Set | Self::Delete | Self::DeleteMulti)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cache operation with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation<V> {
    /// Reads one key.
    Get {
        /// The key to read.
        key: String,
    },
    /// Reads several keys.
    GetMulti {
        /// The keys to read, in result order.
        keys: Vec<String>,
    },
    /// Stores a value unconditionally.
    Set {
        /// The key to write.
        key: String,
        /// The value to store.
        value: V,
        /// Time-to-live in seconds, `0` for no expiration.
        ttl: u32,
    },
    /// Stores a value if the key is absent.
    Add {
        /// The key to write.
        key: String,
        /// The value to store.
        value: V,
        /// Time-to-live in seconds, `0` for no expiration.
        ttl: u32,
    },
    /// Stores a value if the key is present.
    Replace {
        /// The key to write.
        key: String,
        /// The value to store.
        value: V,
        /// Time-to-live in seconds, `0` for no expiration.
        ttl: u32,
    },
    /// Increments a counter.
    Increment {
        /// The counter key.
        key: String,
        /// The amount to add.
        amount: u64,
    },
    /// Decrements a counter.
    Decrement {
        /// The counter key.
        key: String,
        /// The amount to subtract.
        amount: u64,
    },
    /// Removes one key.
    Delete {
        /// The key to remove.
        key: String,
    },
    /// Removes several keys.
    DeleteMulti {
        /// The keys to remove.
        keys: Vec<String>,
    },
    /// Invalidates every key in the pool.
    Flush,
    /// Lists every key in the pool.
    GetAllKeys,
    /// Fetches per-server statistics.
    GetStats,
}

impl<V> Operation<V> {
    /// Returns the verb of this operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Get { .. } => OperationKind::Get,
            Self::GetMulti { .. } => OperationKind::GetMulti,
            Self::Set { .. } => OperationKind::Set,
            Self::Add { .. } => OperationKind::Add,
            Self::Replace { .. } => OperationKind::Replace,
            Self::Increment { .. } => OperationKind::Increment,
            Self::Decrement { .. } => OperationKind::Decrement,
            Self::Delete { .. } => OperationKind::Delete,
            Self::DeleteMulti { .. } => OperationKind::DeleteMulti,
            Self::Flush => OperationKind::Flush,
            Self::GetAllKeys => OperationKind::GetAllKeys,
            Self::GetStats => OperationKind::GetStats,
        }
    }

    /// Returns the key or keys this operation touches.
    #[must_use]
    pub fn target(&self) -> Target<'_> {
        match self {
            Self::Get { key }
            | Self::Set { key, .. }
            | Self::Add { key, .. }
            | Self::Replace { key, .. }
            | Self::Increment { key, .. }
            | Self::Decrement { key, .. }
            | Self::Delete { key } => Target::Key(key),
            Self::GetMulti { keys } | Self::DeleteMulti { keys } => Target::Keys(keys),
            Self::Flush | Self::GetAllKeys | Self::GetStats => Target::None,
        }
    }

    /// Returns `true` if replaying the operation changes backend state.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.kind().is_mutable()
    }

    /// Returns the value carried by a store operation.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Set { value, .. } | Self::Add { value, .. } | Self::Replace { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// The key or keys an operation touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'a> {
    /// The operation addresses the whole pool.
    None,
    /// A single key.
    Key(&'a str),
    /// Several keys, in request order.
    Keys(&'a [String]),
}

impl Target<'_> {
    /// Returns `true` for multi-key targets.
    #[must_use]
    pub fn has_multiple_keys(&self) -> bool {
        matches!(self, Self::Keys(_))
    }

    /// Returns the single key, if this is a single-key target.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    /// Returns the keys in request order; a single key yields a one-element vector.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::Key(key) => vec![*key],
            Self::Keys(keys) => keys.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Key(key) => f.write_str(key),
            Self::Keys(keys) => f.write_str(&keys.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OperationKind; 12] = [
        OperationKind::Get,
        OperationKind::GetMulti,
        OperationKind::Set,
        OperationKind::Add,
        OperationKind::Replace,
        OperationKind::Increment,
        OperationKind::Decrement,
        OperationKind::Delete,
        OperationKind::DeleteMulti,
        OperationKind::Flush,
        OperationKind::GetAllKeys,
        OperationKind::GetStats,
    ];

    #[test]
    fn only_reads_sets_and_deletes_are_bufferable() {
        let bufferable: Vec<_> = ALL.into_iter().filter(|kind| kind.is_bufferable()).collect();
        assert_eq!(
            bufferable,
            vec![
                OperationKind::Get,
                OperationKind::GetMulti,
                OperationKind::Set,
                OperationKind::Delete,
                OperationKind::DeleteMulti
            ]
        );
    }

    #[test]
    fn reads_and_flush_are_not_mutable() {
        for kind in [
            OperationKind::Get,
            OperationKind::GetMulti,
            OperationKind::Flush,
            OperationKind::GetAllKeys,
            OperationKind::GetStats,
        ] {
            assert!(!kind.is_mutable(), "{kind} should not be mutable");
        }
        assert!(OperationKind::DeleteMulti.is_mutable());
    }

    #[test]
    fn names_match_event_vocabulary() {
        assert_eq!(OperationKind::GetMulti.as_str(), "getMulti");
        assert_eq!(OperationKind::DeleteMulti.to_string(), "deleteMulti");
        assert_eq!(OperationKind::GetAllKeys.as_str(), "getAllKeys");
        assert_eq!(OperationKind::GetStats.as_str(), "getStats");
    }

    #[test]
    fn target_reflects_arguments() {
        let set = Operation::Set {
            key: "k".to_string(),
            value: 1,
            ttl: 0,
        };
        assert_eq!(set.target(), Target::Key("k"));
        assert_eq!(set.value(), Some(&1));

        let keys = vec!["a".to_string(), "b".to_string()];
        let multi: Operation<i32> = Operation::DeleteMulti { keys: keys.clone() };
        assert!(multi.target().has_multiple_keys());
        assert_eq!(multi.target().to_string(), "a, b");
        assert_eq!(multi.target().keys(), vec!["a", "b"]);

        let flush: Operation<i32> = Operation::Flush;
        assert_eq!(flush.target(), Target::None);
        assert_eq!(flush.value(), None);
    }
}
