// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backend capability interface for cache client adapters.
//!
//! This crate defines the [`Backend`] trait that every cache server adapter must satisfy,
//! along with the [`Failure`] record backends use to report trouble, the [`Server`]
//! address record, [`ServerStats`] snapshots, and the insertion-ordered [`MultiValue`]
//! map returned by multi-key reads.
//!
//! # Overview
//!
//! A backend is a thin pass-through to a real cache client library. It does not buffer,
//! notify, or retry; it executes exactly one operation and reports the outcome as an
//! [`Outcome`]. Buffering, notifications, and failure handling are layered on top by
//! `cachebuf`.
//!
//! # Implementing a Backend
//!
//! ```
//! use std::collections::HashMap;
//!
//! use cachebuf_backend::{Backend, Outcome, ServerStats};
//!
//! #[derive(Default)]
//! struct MapBackend(HashMap<String, i32>);
//!
//! impl Backend<i32> for MapBackend {
//!     fn add_server(&mut self, _host: &str, _port: u16) {}
//!
//!     fn get(&mut self, key: &str) -> Outcome<Option<i32>> {
//!         Ok(self.0.get(key).copied())
//!     }
//!
//!     fn get_multi(&mut self, keys: &[String]) -> Outcome<HashMap<String, i32>> {
//!         Ok(keys.iter().filter_map(|k| self.0.get(k).map(|v| (k.clone(), *v))).collect())
//!     }
//!
//!     fn set(&mut self, key: &str, value: &i32, _ttl: u32) -> Outcome<bool> {
//!         self.0.insert(key.to_string(), *value);
//!         Ok(true)
//!     }
//!
//!     fn add(&mut self, key: &str, value: &i32, ttl: u32) -> Outcome<bool> {
//!         if self.0.contains_key(key) { Ok(false) } else { self.set(key, value, ttl) }
//!     }
//!
//!     fn replace(&mut self, key: &str, value: &i32, ttl: u32) -> Outcome<bool> {
//!         if self.0.contains_key(key) { self.set(key, value, ttl) } else { Ok(false) }
//!     }
//!
//!     fn increment(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
//!         Ok(self.0.get_mut(key).map(|v| { *v += amount as i32; i64::from(*v) }))
//!     }
//!
//!     fn decrement(&mut self, key: &str, amount: u64) -> Outcome<Option<i64>> {
//!         Ok(self.0.get_mut(key).map(|v| { *v -= amount as i32; i64::from(*v) }))
//!     }
//!
//!     fn delete(&mut self, key: &str) -> Outcome<bool> {
//!         Ok(self.0.remove(key).is_some())
//!     }
//!
//!     fn delete_multi(&mut self, keys: &[String]) -> Outcome<bool> {
//!         keys.iter().for_each(|k| { self.0.remove(k); });
//!         Ok(true)
//!     }
//!
//!     fn flush(&mut self) -> Outcome<bool> {
//!         self.0.clear();
//!         Ok(true)
//!     }
//!
//!     fn all_keys(&mut self) -> Outcome<Vec<String>> {
//!         Ok(self.0.keys().cloned().collect())
//!     }
//!
//!     fn stats(&mut self) -> Outcome<Vec<ServerStats>> {
//!         Ok(Vec::new())
//!     }
//!
//!     fn close(&mut self) -> Outcome<bool> {
//!         Ok(true)
//!     }
//! }
//! ```
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::MockBackend`], an in-memory backend that
//! records every call and supports failure injection.

mod backend;
mod failure;
mod multi;
mod server;
mod stats;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use backend::{Backend, DEFAULT_TTL, NEVER_EXPIRE, Outcome};
#[doc(inline)]
pub use failure::Failure;
#[doc(inline)]
pub use multi::MultiValue;
#[doc(inline)]
pub use server::{DEFAULT_WEIGHT, Server};
#[doc(inline)]
pub use stats::ServerStats;
