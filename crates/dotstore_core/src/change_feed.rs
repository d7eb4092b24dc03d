//! Change feed for observing store mutations.
//!
//! Every mutation follows the same order: the document changes in memory,
//! the snapshot is saved, and only then is the matching event published.
//! Observers run synchronously inside the call that triggered them and
//! receive the store itself alongside the event.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dotstore_core::{ChangeFeed, EventKind, Store};
//!
//! let feed = ChangeFeed::new();
//! feed.on(EventKind::Ready, |store, _| {
//!     println!("store ready with {} keys", store.len());
//! });
//! feed.on(EventKind::Set, |_, event| println!("changed: {event:?}"));
//!
//! let mut store = Store::open_with_feed("app.json", feed)?;
//! store.set("theme", "dark")?;
//! # Ok::<(), dotstore_core::CoreError>(())
//! ```

use crate::store::Store;
use dotstore_codec::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Name of an event, used to register observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The store finished loading.
    Ready,
    /// A key was set.
    Set,
    /// A key was deleted.
    Delete,
    /// The store was cleared.
    Clear,
    /// Saving the snapshot failed.
    Error,
}

/// A single event from the change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The store finished loading (at open or reload), whether or not the
    /// backing file could be decoded.
    Ready,
    /// A key was set to a value.
    Set {
        /// The dotted key as given by the caller.
        key: String,
        /// The stored value.
        value: Value,
    },
    /// A key was removed.
    Delete {
        /// The dotted key as given by the caller.
        key: String,
    },
    /// Every key was removed.
    Clear,
    /// Writing the snapshot failed. The in-memory document still holds the
    /// change, so memory and disk have diverged.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl ChangeEvent {
    /// Creates a set event.
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        Self::Set {
            key: key.into(),
            value,
        }
    }

    /// Creates a delete event.
    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// Creates an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns the event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            ChangeEvent::Ready => EventKind::Ready,
            ChangeEvent::Set { .. } => EventKind::Set,
            ChangeEvent::Delete { .. } => EventKind::Delete,
            ChangeEvent::Clear => EventKind::Clear,
            ChangeEvent::Error { .. } => EventKind::Error,
        }
    }
}

/// A callback invoked with the store and the event.
pub type Observer = Arc<dyn Fn(&Store, &ChangeEvent) + Send + Sync>;

/// Distributes store events to observers and channel subscribers.
///
/// The change feed:
/// - Publishes only after the snapshot write was attempted
/// - Preserves mutation order
/// - Invokes observers in registration order
/// - Supports multiple observers and subscribers
pub struct ChangeFeed {
    /// Callbacks, with the kind they listen to (`None` for all kinds).
    observers: RwLock<Vec<(Option<EventKind>, Observer)>>,
    /// Channel subscribers.
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
}

impl ChangeFeed {
    /// Creates a change feed with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Registers an observer for one kind of event.
    pub fn on<F>(&self, kind: EventKind, observer: F)
    where
        F: Fn(&Store, &ChangeEvent) + Send + Sync + 'static,
    {
        self.observers.write().push((Some(kind), Arc::new(observer)));
    }

    /// Registers an observer for every event.
    pub fn on_any<F>(&self, observer: F)
    where
        F: Fn(&Store, &ChangeEvent) + Send + Sync + 'static,
    {
        self.observers.write().push((None, Arc::new(observer)));
    }

    /// Subscribes to the change feed through a channel.
    ///
    /// Every future event is sent before the call that caused it returns.
    /// Dropped receivers are pruned on the next emit.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes an event to every matching observer, then to subscribers.
    ///
    /// Observers are snapshotted before they run, so an observer may
    /// register further observers; those see the next event onwards.
    pub fn emit(&self, store: &Store, event: &ChangeEvent) {
        let kind = event.kind();
        let observers: Vec<Observer> = self
            .observers
            .read()
            .iter()
            .filter(|(filter, _)| filter.is_none_or(|k| k == kind))
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(store, event);
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Returns the number of live channel subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("observers", &self.observer_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use dotstore_storage::InMemoryBackend;
    use parking_lot::Mutex;

    fn memory_store(feed: ChangeFeed) -> Store {
        Store::open_with_backend(Config::new(), Box::new(InMemoryBackend::new()), feed).unwrap()
    }

    #[test]
    fn event_kinds() {
        assert_eq!(ChangeEvent::Ready.kind(), EventKind::Ready);
        assert_eq!(ChangeEvent::set("a", Value::Null).kind(), EventKind::Set);
        assert_eq!(ChangeEvent::delete("a").kind(), EventKind::Delete);
        assert_eq!(ChangeEvent::Clear.kind(), EventKind::Clear);
        assert_eq!(ChangeEvent::error("boom").kind(), EventKind::Error);
    }

    #[test]
    fn observers_filter_by_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let feed = ChangeFeed::new();
        let sink = Arc::clone(&seen);
        feed.on(EventKind::Delete, move |_, event| sink.lock().push(event.clone()));

        let store = memory_store(ChangeFeed::new());
        feed.emit(&store, &ChangeEvent::set("a", Value::from(1)));
        feed.emit(&store, &ChangeEvent::delete("a"));

        assert_eq!(*seen.lock(), vec![ChangeEvent::delete("a")]);
    }

    #[test]
    fn on_any_sees_everything_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let feed = ChangeFeed::new();
        let sink = Arc::clone(&seen);
        feed.on_any(move |_, event| sink.lock().push(event.kind()));

        let store = memory_store(ChangeFeed::new());
        feed.emit(&store, &ChangeEvent::Clear);
        feed.emit(&store, &ChangeEvent::error("disk full"));

        assert_eq!(*seen.lock(), vec![EventKind::Clear, EventKind::Error]);
    }

    #[test]
    fn observer_receives_store() {
        let len = Arc::new(Mutex::new(None));
        let feed = ChangeFeed::new();
        let sink = Arc::clone(&len);
        feed.on(EventKind::Ready, move |store, _| *sink.lock() = Some(store.len()));

        let _store = memory_store(feed);
        assert_eq!(*len.lock(), Some(0));
    }

    #[test]
    fn observer_may_register_observers() {
        let feed = Arc::new(ChangeFeed::new());
        let inner = Arc::clone(&feed);
        feed.on(EventKind::Clear, move |_, _| inner.on_any(|_, _| {}));

        let store = memory_store(ChangeFeed::new());
        feed.emit(&store, &ChangeEvent::Clear);

        assert_eq!(feed.observer_count(), 2);
    }

    #[test]
    fn multiple_subscribers() {
        let feed = ChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        let store = memory_store(ChangeFeed::new());
        feed.emit(&store, &ChangeEvent::delete("k"));

        assert_eq!(rx1.try_recv().unwrap(), ChangeEvent::delete("k"));
        assert_eq!(rx2.try_recv().unwrap(), ChangeEvent::delete("k"));
    }

    #[test]
    fn subscriber_cleanup() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.subscriber_count(), 0);

        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);

        let store = memory_store(ChangeFeed::new());
        feed.emit(&store, &ChangeEvent::Clear);
        assert_eq!(feed.subscriber_count(), 0);
    }
}
