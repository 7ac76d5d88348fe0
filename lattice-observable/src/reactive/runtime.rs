//! Reactive Runtime
//!
//! The runtime connects value sources to the computations that read them.
//!
//! # How It Works
//!
//! 1. A memo registers itself with the runtime when it is created.
//!
//! 2. While a memo computes, every signal or memo it reads records the
//!    dependency here (source ID -> subscriber IDs).
//!
//! 3. When a source changes, the runtime looks up its dependents and marks
//!    them maybe-dirty. Memos forward that mark to their own dependents, so
//!    invalidation reaches the whole downstream graph while the actual
//!    recomputation stays lazy.
//!
//! # Locking
//!
//! Both maps live behind `parking_lot` locks. No lock is held while a
//! dependent is being invalidated, since invalidation re-enters the runtime.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::subscriber::{SourceId, SubscriberId};

/// A computation that can be invalidated when one of its sources changes.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID this computation tracks its reads under.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this computation as potentially needing to run again.
    fn mark_maybe_dirty(&self);
}

/// Handle to a registered reactive value.
///
/// Dropping this handle unregisters the reactive value from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

impl std::fmt::Debug for ReactiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveHandle")
            .field("subscriber_id", &self.subscriber_id)
            .finish()
    }
}

/// The global reactive runtime.
pub struct Runtime;

type Registry = RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>>;
type Dependents = RwLock<HashMap<SourceId, Vec<SubscriberId>>>;

// Weak references so a registered memo can still be dropped.
static REGISTRY: OnceLock<Registry> = OnceLock::new();
static DEPENDENTS: OnceLock<Dependents> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn dependents() -> &'static Dependents {
    DEPENDENTS.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Runtime {
    /// Register a reactive value with the runtime.
    ///
    /// Returns a handle that unregisters the value when dropped.
    pub fn register(reactive: Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();
        registry().write().insert(id, Arc::downgrade(&reactive));
        ReactiveHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        registry().write().remove(&id);
        Self::clear_dependencies(id);
    }

    /// Record that `subscriber` read `source`.
    pub fn add_dependency(source: SourceId, subscriber: SubscriberId) {
        let mut map = dependents().write();
        let subscribers = map.entry(source).or_default();
        if !subscribers.contains(&subscriber) {
            subscribers.push(subscriber);
        }
    }

    /// Forget every source `subscriber` depends on.
    ///
    /// Called before a memo recomputes, since the new run may read a
    /// different set of sources.
    pub fn clear_dependencies(subscriber: SubscriberId) {
        let mut map = dependents().write();
        for subscribers in map.values_mut() {
            subscribers.retain(|s| *s != subscriber);
        }
        map.retain(|_, subscribers| !subscribers.is_empty());
    }

    /// Number of computations currently depending on `source`.
    pub fn dependent_count(source: SourceId) -> usize {
        dependents().read().get(&source).map_or(0, Vec::len)
    }

    /// Invalidate every computation that read `source`.
    pub fn notify_source_change(source: SourceId) {
        let subscriber_ids = dependents()
            .read()
            .get(&source)
            .cloned()
            .unwrap_or_default();

        if subscriber_ids.is_empty() {
            return;
        }

        let reactives: Vec<Arc<dyn Reactive>> = {
            let registry = registry().read();
            subscriber_ids
                .iter()
                .filter_map(|id| registry.get(id).and_then(Weak::upgrade))
                .collect()
        };

        tracing::trace!(
            source = source.raw(),
            dependents = reactives.len(),
            "propagating source change"
        );

        for reactive in reactives {
            reactive.mark_maybe_dirty();
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a reactive context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}
