//! Reactive Context
//!
//! The reactive context records which computation is currently running so
//! that reads of signals and memos can be attributed to it.
//!
//! # Implementation
//!
//! Each thread keeps a stack of entries. Running a memo pushes an entry for
//! its subscriber ID; every source read while that entry is on top is
//! recorded against it. Nested memos push their own entries, so an inner
//! computation never leaks its reads into the outer one.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::subscriber::{SourceId, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone)]
struct ContextEntry {
    subscriber_id: SubscriberId,
    /// Sources read during this computation, without duplicates.
    dependencies: SmallVec<[SourceId; 8]>,
}

/// Guard that keeps a tracking context active until dropped.
///
/// Dropping pops the entry again, which keeps the stack balanced even when
/// the computation unwinds.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: SmallVec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.subscriber_id))
    }

    /// Record a read of `source` against the innermost context.
    pub fn track_dependency(source: SourceId) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if !entry.dependencies.contains(&source) {
                    entry.dependencies.push(source);
                }
            }
        });
    }

    /// Sources read so far in the innermost context.
    pub fn get_dependencies() -> Vec<SourceId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.to_vec())
                .unwrap_or_default()
        })
    }

    /// Run `f` with dependency tracking suspended.
    ///
    /// Reads inside `f` are not attributed to any enclosing computation.
    pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
        struct Restore(Vec<ContextEntry>);

        impl Drop for Restore {
            fn drop(&mut self) {
                let saved = std::mem::take(&mut self.0);
                CONTEXT_STACK.with(|stack| *stack.borrow_mut() = saved);
            }
        }

        let _restore = Restore(CONTEXT_STACK.with(|stack| std::mem::take(&mut *stack.borrow_mut())));
        f()
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}
