// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Insertion-ordered results of multi-key reads.

use std::collections::HashMap;

/// The result of a multi-key read, ordered like the request.
///
/// Every requested key is present. Keys that were not found map to `None`, the missing
/// sentinel. Iteration follows insertion order, which callers assemble from the original
/// request so results line up with the keys asked for regardless of how the server
/// answered.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use cachebuf_backend::MultiValue;
///
/// let keys = vec!["abc".to_string(), "def".to_string(), "ghi".to_string()];
/// let found = HashMap::from([("def".to_string(), 456), ("abc".to_string(), 123)]);
///
/// let values = MultiValue::assemble(&keys, found);
/// let pairs: Vec<_> = values.iter().collect();
/// assert_eq!(pairs, vec![("abc", Some(&123)), ("def", Some(&456)), ("ghi", None)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiValue<V> {
    entries: Vec<(String, Option<V>)>,
    index: HashMap<String, usize>,
}

impl<V> Default for MultiValue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MultiValue<V> {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a result with every key mapped to the missing sentinel.
    #[must_use]
    pub fn missing(keys: &[String]) -> Self {
        keys.iter().map(|key| (key.clone(), None)).collect()
    }

    /// Orders the values a backend found by the requested keys.
    ///
    /// Keys absent from `found` map to `None`; entries of `found` that were not
    /// requested are dropped.
    #[must_use]
    pub fn assemble(keys: &[String], mut found: HashMap<String, V>) -> Self {
        keys.iter().map(|key| (key.clone(), found.remove(key))).collect()
    }

    /// Inserts or overwrites an entry.
    ///
    /// A key that is already present keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<V>) {
        let key = key.into();
        if let Some(&position) = self.index.get(&key) {
            self.entries[position].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    /// Returns the value for `key`, or `None` when it is missing or was not requested.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).and_then(|&position| self.entries[position].1.as_ref())
    }

    /// Returns `true` if `key` was part of the request.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the result holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&V>)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_ref()))
    }
}

impl<V> FromIterator<(String, Option<V>)> for MultiValue<V> {
    fn from_iter<I: IntoIterator<Item = (String, Option<V>)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

impl<V> IntoIterator for MultiValue<V> {
    type Item = (String, Option<V>);
    type IntoIter = std::vec::IntoIter<(String, Option<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
