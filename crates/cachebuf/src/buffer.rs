// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use crate::Operation;

/// A pending key state inside a buffering session.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Staged<V> {
    Written(V),
    Deleted,
}

/// The queue and shadow of one buffering session.
///
/// A key absent from the shadow is unknown and must be read from the backend. A key
/// staged as deleted reads as missing without touching the backend.
#[derive(Debug)]
pub(crate) struct BufferSession<V> {
    queue: Vec<Operation<V>>,
    shadow: HashMap<String, Staged<V>>,
}

impl<V> BufferSession<V> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Vec::new(),
            shadow: HashMap::new(),
        }
    }

    /// Resolves a key against the shadow.
    ///
    /// Returns `None` when the key is unknown, `Some(None)` when it was deleted.
    pub(crate) fn lookup(&self, key: &str) -> Option<Option<&V>> {
        self.shadow.get(key).map(|staged| match staged {
            Staged::Written(value) => Some(value),
            Staged::Deleted => None,
        })
    }

    pub(crate) fn queue(&self) -> &[Operation<V>] {
        &self.queue
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn into_queue(self) -> Vec<Operation<V>> {
        self.queue
    }
}

impl<V: Clone> BufferSession<V> {
    /// Records a mutation in the shadow and appends it to the queue.
    ///
    /// Later mutations of the same key overwrite earlier shadow entries.
    pub(crate) fn stage(&mut self, operation: Operation<V>) {
        match &operation {
            Operation::Set { key, value, .. } => {
                self.shadow.insert(key.clone(), Staged::Written(value.clone()));
            }
            Operation::Delete { key } => {
                self.shadow.insert(key.clone(), Staged::Deleted);
            }
            Operation::DeleteMulti { keys } => {
                for key in keys {
                    self.shadow.insert(key.clone(), Staged::Deleted);
                }
            }
            _ => {}
        }
        self.queue.push(operation);
    }
}

/// Summary of a committed buffering session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    replayed: usize,
    failed: usize,
}

impl CommitReport {
    pub(crate) fn new(replayed: usize, failed: usize) -> Self {
        Self { replayed, failed }
    }

    /// Returns the number of queued operations sent to the backend.
    #[must_use]
    pub fn replayed(&self) -> usize {
        self.replayed
    }

    /// Returns the number of replayed operations the backend reported as failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Returns `true` if every replayed operation succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
