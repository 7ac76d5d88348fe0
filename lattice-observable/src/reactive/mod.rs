//! Reactive Primitives
//!
//! The cell layer that observable objects are built on: signals, memos,
//! the dependency-tracking runtime, and a plain event channel.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Reads inside a tracking
//! context register a dependency; writes that actually change the value
//! (as judged by the signal's comparer) invalidate every dependent.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only
//! when one of its dependencies changed and somebody reads it again.
//!
//! ## Event channels
//!
//! An EventChannel delivers events synchronously to its listeners. It is
//! independent of dependency tracking and is what object-level change
//! notifications travel through.
//!
//! # Implementation Notes
//!
//! Dependencies are discovered automatically through a thread-local
//! tracking stack ([`ReactiveContext`]). Invalidation is pushed eagerly
//! through the global [`Runtime`]; values are pulled lazily.

mod channel;
mod context;
mod memo;
mod runtime;
mod signal;
mod subscriber;

pub use channel::{Disposer, EventChannel};
pub use context::ReactiveContext;
pub use memo::{Memo, MemoState};
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use signal::{Comparer, Signal};
pub use subscriber::{SourceId, Subscriber, SubscriberId};
