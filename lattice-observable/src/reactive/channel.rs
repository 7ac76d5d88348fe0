//! Event Channel
//!
//! A small synchronous publish/subscribe primitive. Observable objects use
//! one per object to deliver change events, but it knows nothing about
//! objects: any `E` can be published.
//!
//! Delivery walks a snapshot of the listener list, so listeners may
//! subscribe or dispose from inside a callback. A listener disposed during a
//! publish is skipped for the rest of that publish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::subscriber::Subscriber;

type Listeners<E> = RwLock<Vec<Subscriber<E>>>;

/// Synchronous, ordered event delivery to a set of listeners.
pub struct EventChannel<E> {
    listeners: Arc<Listeners<E>>,
}

impl<E: 'static> EventChannel<E> {
    /// Create a channel with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register `callback` for every event published from now on.
    ///
    /// The returned [`Disposer`] removes the callback again.
    pub fn subscribe<F>(&self, callback: F) -> Disposer
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(callback);
        let handle = subscriber.clone();
        self.listeners.write().push(subscriber);

        let listeners: Weak<Listeners<E>> = Arc::downgrade(&self.listeners);
        Disposer::new(move || {
            handle.deactivate();
            if let Some(listeners) = listeners.upgrade() {
                listeners.write().retain(|s| s.id() != handle.id());
            }
        })
    }

    /// Deliver `event` to all current listeners, in subscription order.
    pub fn publish(&self, event: &E) {
        let snapshot: SmallVec<[Subscriber<E>; 4]> =
            self.listeners.read().iter().cloned().collect();

        for subscriber in &snapshot {
            subscriber.notify(event);
        }
    }

    /// Number of listeners currently subscribed.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

/// Handle returned by a subscription.
///
/// Calling [`Disposer::dispose`] unsubscribes; further calls do nothing.
/// Dropping the handle leaves the subscription in place.
pub struct Disposer {
    disposed: AtomicBool,
    release: Box<dyn Fn() + Send + Sync>,
}

impl Disposer {
    fn new<F>(release: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            disposed: AtomicBool::new(false),
            release: Box::new(release),
        }
    }

    /// Stop the subscription.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            (self.release)();
        }
    }

    /// Whether [`Disposer::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&i32) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |tag: &str| -> Box<dyn Fn(&i32) + Send + Sync> {
            let log = log_clone.clone();
            let tag = tag.to_string();
            Box::new(move |n: &i32| log.lock().push(format!("{tag}:{n}")))
        };
        (log, make)
    }

    #[test]
    fn publishes_in_subscription_order() {
        let channel = EventChannel::new();
        let (log, make) = recorder();

        let _a = channel.subscribe(make("a"));
        let _b = channel.subscribe(make("b"));
        channel.publish(&1);
        channel.publish(&2);

        assert_eq!(*log.lock(), vec!["a:1", "b:1", "a:2", "b:2"]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let channel = EventChannel::new();
        let (log, make) = recorder();

        let a = channel.subscribe(make("a"));
        let _b = channel.subscribe(make("b"));
        assert_eq!(channel.listener_count(), 2);

        a.dispose();
        a.dispose();
        assert!(a.is_disposed());
        assert_eq!(channel.listener_count(), 1);

        channel.publish(&7);
        assert_eq!(*log.lock(), vec!["b:7"]);
    }

    #[test]
    fn dropping_disposer_keeps_subscription() {
        let channel = EventChannel::new();
        let (log, make) = recorder();

        drop(channel.subscribe(make("a")));
        channel.publish(&3);

        assert_eq!(*log.lock(), vec!["a:3"]);
    }

    #[test]
    fn listener_disposed_mid_publish_is_skipped() {
        let channel: EventChannel<i32> = EventChannel::new();
        let (log, make) = recorder();

        let late: Arc<Mutex<Option<Disposer>>> = Arc::new(Mutex::new(None));
        let late_clone = late.clone();
        let _first = channel.subscribe(move |_: &i32| {
            if let Some(disposer) = late_clone.lock().as_ref() {
                disposer.dispose();
            }
        });
        *late.lock() = Some(channel.subscribe(make("late")));

        channel.publish(&1);
        assert!(log.lock().is_empty());
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn disposer_outlives_channel() {
        let channel: EventChannel<i32> = EventChannel::new();
        let disposer = channel.subscribe(|_| {});
        drop(channel);
        disposer.dispose();
        assert!(disposer.is_disposed());
    }
}
