//! Signal Implementation
//!
//! A Signal holds a value and reports reads and changes to the runtime.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (a memo computing),
//!    the read is recorded as a dependency of that memo.
//!
//! 2. When a signal is written, its comparer decides whether the new value
//!    differs from the stored one. Only a real change is stored and
//!    propagated; `set` reports which of the two happened.
//!
//! 3. Propagation marks dependent memos maybe-dirty. They recompute the
//!    next time somebody reads them.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::SourceId;

/// Equality policy deciding whether a write (or recomputation) changed a value.
///
/// Returns `true` when the two values count as equal.
pub type Comparer<T> = fn(&T, &T) -> bool;

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// assert!(count.set(5));
/// assert!(!count.set(5)); // unchanged, nothing propagated
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    id: SourceId,

    /// Diagnostic name, e.g. `"Person.age"`.
    name: Arc<str>,

    value: Arc<RwLock<T>>,

    comparer: Comparer<T>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal that compares values with `PartialEq`.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_comparer(value, |a, b| a == b)
    }

    /// Create a new signal with a custom equality policy.
    pub fn with_comparer(value: T, comparer: Comparer<T>) -> Self {
        let id = SourceId::new();
        Self {
            id,
            name: format!("Signal@{}", id.raw()).into(),
            value: Arc::new(RwLock::new(value)),
            comparer,
        }
    }

    /// Give the signal a diagnostic name.
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Get the signal's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current value.
    ///
    /// Inside a reactive context this also records the read.
    pub fn get(&self) -> T {
        if let Some(subscriber) = ReactiveContext::current_subscriber() {
            ReactiveContext::track_dependency(self.id);
            Runtime::add_dependency(self.id, subscriber);
        }
        self.get_untracked()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Store `value` if it differs from the current one.
    ///
    /// Returns whether the value changed. Dependents are invalidated only
    /// on a change, and before this returns.
    pub fn set(&self, value: T) -> bool {
        {
            let mut guard = self.value.write();
            if (self.comparer)(&*guard, &value) {
                return false;
            }
            *guard = value;
        }

        tracing::trace!(signal = %self.name, "signal changed");
        Runtime::notify_source_change(self.id);
        true
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            value: Arc::clone(&self.value),
            comparer: self.comparer,
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &self.get_untracked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::SubscriberId;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        assert!(signal.set(42));
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn equal_write_reports_unchanged() {
        let signal = Signal::new(7);
        assert!(!signal.set(7));
        assert!(signal.set(8));
        assert!(!signal.set(8));
    }

    #[test]
    fn custom_comparer_decides_change() {
        // Treat values as equal when they agree modulo 10.
        let signal = Signal::with_comparer(3, |a, b| a % 10 == b % 10);

        assert!(!signal.set(13));
        assert_eq!(signal.get(), 3);

        assert!(signal.set(4));
        assert_eq!(signal.get(), 4);
    }

    #[test]
    fn read_inside_context_records_dependency() {
        let signal = Signal::new("a".to_string());
        let subscriber = SubscriberId::new();

        {
            let _ctx = ReactiveContext::enter(subscriber);
            signal.get();
            assert_eq!(ReactiveContext::get_dependencies(), vec![signal.id()]);
        }

        assert_eq!(Runtime::dependent_count(signal.id()), 1);
        Runtime::clear_dependencies(subscriber);
    }

    #[test]
    fn untracked_read_records_nothing() {
        let signal = Signal::new(1);
        let _ctx = ReactiveContext::enter(SubscriberId::new());

        signal.get_untracked();
        assert!(ReactiveContext::get_dependencies().is_empty());
        assert_eq!(Runtime::dependent_count(signal.id()), 0);
    }

    #[test]
    fn clone_shares_state_and_name() {
        let first = Signal::new(0).named("Counter.count");
        let second = first.clone();

        first.set(42);
        assert_eq!(second.get(), 42);
        assert_eq!(second.name(), "Counter.count");
        assert_eq!(first.id(), second.id());
    }
}
