//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result.
//!
//! 2. While computing, every signal or memo it reads is recorded with the
//!    runtime as one of its sources.
//!
//! 3. When a source changes, the runtime marks the memo "maybe dirty". The
//!    memo passes that mark on to whoever reads *it*, so a chain of memos
//!    is invalidated in one sweep.
//!
//! 4. The next access recomputes. The comparer then decides whether the
//!    new result is a change: if it is not, the previously cached value is
//!    kept and the version stays the same.
//!
//! # Why This Matters
//!
//! Memos that are invalidated but never read again never recompute.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use super::signal::Comparer;
use super::subscriber::{SourceId, SubscriberId};

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency might have changed. Need to check.
    MaybeDirty,

    /// The memo definitely needs to recompute.
    Dirty,
}

/// A cached derived value that recomputes only when dependencies change.
///
/// Clones share the cache and the runtime registration; the memo is
/// unregistered when the last clone is dropped.
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoInner<T>>,
    _registration: Arc<ReactiveHandle>,
}

struct MemoInner<T> {
    /// Identity of the memo as a value source for others.
    id: SourceId,

    /// Identity of the memo's computation as a reader of other sources.
    subscriber_id: SubscriberId,

    name: Arc<str>,
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    comparer: Comparer<T>,

    /// The cached value (None if never computed).
    value: RwLock<Option<T>>,
    state: RwLock<MemoState>,

    /// Sources read during the last computation.
    dependencies: RwLock<Vec<SourceId>>,

    /// Bumped every time a recomputation produces a changed value.
    version: AtomicU64,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new memo that compares results with `PartialEq`.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: PartialEq,
    {
        Self::with_comparer(compute, |a, b| a == b)
    }

    /// Create a new memo with a custom equality policy for its results.
    pub fn with_comparer<F>(compute: F, comparer: Comparer<T>) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let id = SourceId::new();
        Self::from_inner(MemoInner {
            id,
            subscriber_id: SubscriberId::new(),
            name: format!("Memo@{}", id.raw()).into(),
            compute: Arc::new(compute),
            comparer,
            value: RwLock::new(None),
            state: RwLock::new(MemoState::Dirty),
            dependencies: RwLock::new(Vec::new()),
            version: AtomicU64::new(0),
        })
    }

    fn from_inner(inner: MemoInner<T>) -> Self {
        let inner = Arc::new(inner);
        let registration = Runtime::register(inner.clone());
        Self {
            inner,
            _registration: Arc::new(registration),
        }
    }

    /// Give the memo a diagnostic name.
    ///
    /// Only valid before the memo is shared, which is how the builders in
    /// this crate use it.
    pub fn named(self, name: impl Into<Arc<str>>) -> Self {
        let Self { inner, _registration } = self;
        match Arc::try_unwrap(inner) {
            Ok(mut owned) => {
                // The registry points at the old allocation; register anew.
                drop(_registration);
                owned.name = name.into();
                Self::from_inner(owned)
            }
            Err(shared) => Self {
                inner: shared,
                _registration,
            },
        }
    }

    /// Get the memo's unique source ID.
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Get the subscriber ID for this memo.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Get the memo's diagnostic name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        if let Some(current) = ReactiveContext::current_subscriber() {
            ReactiveContext::track_dependency(self.inner.id);
            Runtime::add_dependency(self.inner.id, current);
        }

        let cached = match self.state() {
            MemoState::Clean => self.inner.value.read().clone(),
            MemoState::MaybeDirty | MemoState::Dirty => None,
        };

        match cached {
            Some(value) => value,
            None => self.inner.recompute(),
        }
    }

    /// Mark the memo as potentially needing recomputation.
    pub fn mark_maybe_dirty(&self) {
        self.inner.mark_maybe_dirty();
    }

    /// Mark the memo as definitely needing recomputation.
    pub fn mark_dirty(&self) {
        let was_clean = {
            let mut state = self.inner.state.write();
            let was_clean = *state == MemoState::Clean;
            *state = MemoState::Dirty;
            was_clean
        };
        if was_clean {
            Runtime::notify_source_change(self.inner.id);
        }
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        *self.inner.state.read()
    }

    /// Number of recomputations that produced a changed value.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Number of sources read during the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }
}

impl<T> MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn recompute(&self) -> T {
        Runtime::clear_dependencies(self.subscriber_id);

        let (computed, dependencies) = {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            let computed = (self.compute)();
            (computed, ReactiveContext::get_dependencies())
        };
        *self.dependencies.write() = dependencies;

        let mut slot = self.value.write();
        let changed = slot
            .as_ref()
            .map_or(true, |current| !(self.comparer)(current, &computed));

        let result = if changed {
            self.version.fetch_add(1, Ordering::SeqCst);
            *slot = Some(computed.clone());
            computed
        } else {
            slot.clone().unwrap_or(computed)
        };
        *self.state.write() = MemoState::Clean;

        tracing::trace!(memo = %self.name, changed, "memo recomputed");
        result
    }
}

impl<T> Reactive for MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {
        let was_clean = {
            let mut state = self.state.write();
            let was_clean = *state == MemoState::Clean;
            if was_clean {
                *state = MemoState::MaybeDirty;
            }
            was_clean
        };
        // Already-dirty memos have forwarded the mark before.
        if was_clean {
            Runtime::notify_source_change(self.id);
        }
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _registration: Arc::clone(&self._registration),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("version", &self.version())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
