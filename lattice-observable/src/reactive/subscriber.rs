//! Identifiers and listener records for the reactive system.
//!
//! Two kinds of identity flow through the dependency maps: a `SourceId`
//! names something that can be read (a signal or a memo), a `SubscriberId`
//! names something that reads (a memo's computation, an event listener).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscriber.
///
/// Memos use it to register their computation with the runtime, and event
/// channels use it to find a listener again when it is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a readable value source.
///
/// Signals and memos draw from the same counter so their IDs never collide
/// in the runtime's dependency map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Generate a new unique source ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener for events of type `E`.
///
/// Clones share the callback and the active flag, so a subscriber that was
/// snapshotted for delivery still observes a later deactivation.
pub struct Subscriber<E> {
    id: SubscriberId,
    notify: Arc<dyn Fn(&E) + Send + Sync>,
    active: Arc<AtomicBool>,
}

impl<E> Subscriber<E> {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Arc::new(notify),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the subscriber still wants events.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop delivering events to this subscriber.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Deliver an event. Inactive subscribers ignore it.
    pub fn notify(&self, event: &E) {
        if self.is_active() {
            (self.notify)(event);
        }
    }
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            notify: Arc::clone(&self.notify),
            active: Arc::clone(&self.active),
        }
    }
}

impl<E> std::fmt::Debug for Subscriber<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
