// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query notifications.
//!
//! Every direct execution emits a [`Before`](EventKind::Before) and an
//! [`After`](EventKind::After) event. When the backend reports a failure, a
//! [`Fail`](EventKind::Fail) event carrying the [`Failure`] is emitted between the two.
//! Events are a side channel only; handlers cannot change the outcome of an operation.

use std::{collections::HashMap, fmt};

use cachebuf_backend::Failure;

use crate::{OperationKind, operation::Target};

/// The kind of a query notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Emitted before the backend is invoked.
    Before,
    /// Emitted after the backend returned, whether it succeeded or not.
    After,
    /// Emitted when the backend reported a failure.
    Fail,
}

impl EventKind {
    /// Returns the event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "cache.query.before",
            Self::After => "cache.query.after",
            Self::Fail => "cache.query.fail",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the operation a [`Before`](Event::Before) or [`After`](Event::After)
/// event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryEvent<'a> {
    operation: OperationKind,
    target: Target<'a>,
    mutable: bool,
}

impl<'a> QueryEvent<'a> {
    pub(crate) fn new(operation: OperationKind, target: Target<'a>, mutable: bool) -> Self {
        Self {
            operation,
            target,
            mutable,
        }
    }

    /// Returns the operation being executed.
    #[must_use]
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Returns the key or keys the operation touches.
    #[must_use]
    pub fn target(&self) -> Target<'a> {
        self.target
    }

    /// Returns `true` if the operation was issued with several keys.
    #[must_use]
    pub fn has_multiple_keys(&self) -> bool {
        self.target.has_multiple_keys()
    }

    /// Returns `true` if the operation changes backend state.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

/// A query notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// The backend is about to be invoked.
    Before(QueryEvent<'a>),
    /// The backend call has returned.
    After(QueryEvent<'a>),
    /// The backend call failed.
    Fail(&'a Failure),
}

impl Event<'_> {
    /// Returns the kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Before(_) => EventKind::Before,
            Self::After(_) => EventKind::After,
            Self::Fail(_) => EventKind::Fail,
        }
    }
}

type Handler = Box<dyn Fn(&Event<'_>) + Send + Sync>;

/// Routes query notifications to registered handlers.
///
/// Several handlers may listen to the same kind; they run in registration order.
///
/// # Examples
///
/// ```
/// use std::sync::{
///     Arc,
///     atomic::{AtomicUsize, Ordering},
/// };
///
/// use cachebuf::{EventDispatcher, EventKind};
///
/// let failures = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&failures);
///
/// let mut dispatcher = EventDispatcher::new();
/// dispatcher.add_listener(EventKind::Fail, move |_| {
///     counter.fetch_add(1, Ordering::Relaxed);
/// });
///
/// assert_eq!(dispatcher.listener_count(EventKind::Fail), 1);
/// assert_eq!(dispatcher.listener_count(EventKind::Before), 0);
/// ```
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event kind.
    pub fn add_listener<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every handler registered for the event's kind.
    pub fn dispatch(&self, event: &Event<'_>) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("before", &self.listener_count(EventKind::Before))
            .field("after", &self.listener_count(EventKind::After))
            .field("fail", &self.listener_count(EventKind::Fail))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn handlers_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        for id in 0..3 {
            let seen = Arc::clone(&seen);
            dispatcher.add_listener(EventKind::Before, move |_| seen.lock().unwrap().push(id));
        }

        dispatcher.dispatch(&Event::Before(QueryEvent::new(OperationKind::Get, Target::Key("k"), false)));

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dispatch_only_reaches_matching_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let sink = Arc::clone(&seen);
        dispatcher.add_listener(EventKind::Fail, move |event| sink.lock().unwrap().push(event.kind()));

        dispatcher.dispatch(&Event::After(QueryEvent::new(OperationKind::Flush, Target::None, false)));
        let failure = Failure::new("boom");
        dispatcher.dispatch(&Event::Fail(&failure));

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Fail]);
    }

    #[test]
    fn event_names() {
        assert_eq!(EventKind::Before.to_string(), "cache.query.before");
        assert_eq!(EventKind::After.as_str(), "cache.query.after");
        assert_eq!(EventKind::Fail.as_str(), "cache.query.fail");
    }

    #[test]
    fn query_event_accessors() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let event = QueryEvent::new(OperationKind::DeleteMulti, Target::Keys(&keys), true);
        assert_eq!(event.operation(), OperationKind::DeleteMulti);
        assert!(event.has_multiple_keys());
        assert!(event.is_mutable());
        assert_eq!(event.target().keys(), vec!["a", "b"]);
    }

    #[test]
    fn debug_shows_listener_counts() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_listener(EventKind::After, |_| {});
        let debug_str = format!("{dispatcher:?}");
        assert!(debug_str.contains("after: 1"), "got: {debug_str}");
    }
}
