// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A uniform Memcache, Memcached, and Redis client with write-behind buffering.
//!
//! Application code talks to an [`Adapter`], which exposes one method per cache verb
//! over any [`Backend`](cachebuf_backend::Backend). Every call becomes an [`Operation`]
//! descriptor handed to a single execution engine that decides whether to run it now or
//! defer it.
//!
//! # Buffering
//!
//! Between [`Adapter::begin_buffer`] and [`Adapter::commit_buffer`], sets and deletes are
//! queued instead of sent. A local shadow of the queued mutations answers later reads of
//! the same keys, so the caller reads its own writes without a round trip. Keys the
//! shadow does not know are still read from the backend. Committing replays the queue in
//! issue order; [`Adapter::rollback_buffer`] throws it away.
//!
//! Only `get`, `get_multi`, `set`, `delete`, and `delete_multi` are allowed while
//! buffering. Anything else fails with [`ErrorKind::OperationNotSupported`].
//!
//! ```
//! use cachebuf::Adapter;
//! use cachebuf_backend::testing::{BackendCall, MockBackend};
//!
//! # fn main() -> cachebuf::Result<()> {
//! let backend = MockBackend::<String>::new();
//! let mut cache = Adapter::new(backend.clone());
//!
//! cache.begin_buffer()?;
//! cache.set("greeting", "hello".to_string())?;
//! cache.delete("stale")?;
//!
//! assert_eq!(cache.get("greeting")?, Some("hello".to_string()));
//! assert_eq!(cache.get("stale")?, None);
//! assert!(backend.calls().is_empty());
//!
//! cache.commit_buffer();
//! assert_eq!(backend.calls().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Commit is not atomic: a failing replayed operation is reported and the rest of the
//! queue still runs.
//!
//! # Events
//!
//! Handlers registered with [`Adapter::bind`] observe every direct execution: a
//! `cache.query.before` event, a `cache.query.fail` event when the backend reports a
//! [`Failure`](cachebuf_backend::Failure), and a `cache.query.after` event. Backend
//! failures never become errors; the call returns its sentinel value instead.
//!
//! # Backends
//!
//! The `memcache` feature provides the memcache and memcached flavors and the `redis`
//! feature provides Redis. Both are on by default. [`Factory`] validates a server list
//! and builds an adapter over the preferred available backend.

mod adapter;
#[cfg(any(feature = "memcache", feature = "redis"))]
mod any_backend;
mod buffer;
mod config;
mod engine;
mod error;
mod events;
mod factory;
mod operation;
mod reply;
mod telemetry;

#[doc(inline)]
pub use adapter::Adapter;
#[cfg(any(feature = "memcache", feature = "redis"))]
#[doc(inline)]
pub use any_backend::AnyBackend;
#[doc(inline)]
pub use buffer::CommitReport;
#[doc(inline)]
pub use config::{ConfigService, ServerConfig};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use events::{Event, EventDispatcher, EventKind, QueryEvent};
#[cfg(any(feature = "memcache", feature = "redis"))]
#[doc(inline)]
pub use factory::Factory;
#[doc(inline)]
pub use factory::BackendType;
#[doc(inline)]
pub use operation::{Operation, OperationKind, Target};
