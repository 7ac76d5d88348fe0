//! Object Administration
//!
//! The administration is the per-object record that turns an [`Object`]
//! into an observable object. It lives in the object's hidden slot, owns
//! the name-to-cell map, and holds the change channel once somebody
//! observes the object.
//!
//! # Lifecycle
//!
//! 1. [`as_observable_object`] attaches a record on first use and returns
//!    the same record on every later call.
//!
//! 2. [`Administration::set_property`] installs a cell the first time a
//!    name is written (an `add` event) and writes through the existing
//!    accessor afterwards (an `update` event, if the value changed).
//!
//! 3. [`observe_object`] allocates the channel on first subscription. Until
//!    then no events are built at all.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::change::ObjectChange;
use super::mode::ValueMode;
use super::options::ObjectOptions;
use super::property::{Accessor, Cell, Initializer};
use super::target::{HiddenSlot, Marker, Object, WeakObject};
use crate::error::{ObjectError, Result};
use crate::reactive::{Disposer, EventChannel};

/// The marker carried by every administration this module attaches.
pub fn observable_object_marker() -> Marker {
    Marker::of::<Administration>("observable object")
}

fn next_administration_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Per-object record governing an observable object's properties.
pub struct Administration {
    marker: Marker,
    target: WeakObject,
    name: String,
    mode: ValueMode,
    cells: RwLock<HashMap<String, Cell>>,
    channel: OnceLock<EventChannel<ObjectChange>>,
}

/// Attach an administration to `target`, or return the one it already has.
///
/// Without a `name` the record is named `ObservableObject@<n>`. Fails with
/// [`ObjectError::TypeMismatch`] when the hidden slot belongs to another
/// scheme; the target is left untouched in that case.
pub fn as_observable_object(
    target: &Object,
    name: Option<&str>,
    mode: ValueMode,
) -> Result<Arc<Administration>> {
    if let Some(slot) = target.hidden_slot() {
        return adopt(slot);
    }

    let name = match name {
        Some(name) => name.to_owned(),
        None => format!("ObservableObject@{}", next_administration_id()),
    };
    tracing::debug!(object = %name, mode = mode.as_str(), "attaching administration");

    let administration = Arc::new(Administration {
        marker: observable_object_marker(),
        target: target.downgrade(),
        name,
        mode,
        cells: RwLock::new(HashMap::new()),
        channel: OnceLock::new(),
    });
    adopt(target.define_hidden(HiddenSlot::new(observable_object_marker(), administration)))
}

fn adopt(slot: &HiddenSlot) -> Result<Arc<Administration>> {
    let mismatch = || ObjectError::TypeMismatch {
        found: slot.marker().scheme(),
    };
    if slot.marker() != observable_object_marker() {
        return Err(mismatch());
    }
    slot.downcast::<Administration>().ok_or_else(mismatch)
}

/// Whether `thing` is an [`Object`] governed by an administration.
///
/// Accepts any value; non-objects are simply not observable.
pub fn is_observable_object(thing: &dyn Any) -> bool {
    thing
        .downcast_ref::<Object>()
        .is_some_and(|object| object.administration().is_some())
}

/// Subscribe `callback` to every change on `target`.
///
/// Fails with [`ObjectError::Precondition`] if `target` has no
/// administration; nothing is subscribed then.
pub fn observe_object<F>(target: &Object, callback: F) -> Result<Disposer>
where
    F: Fn(&ObjectChange) + Send + Sync + 'static,
{
    let administration = target.administration().ok_or(ObjectError::Precondition {
        message: "expected observable object",
    })?;
    Ok(administration.observe(callback))
}

/// Make `target` observable and set each of `properties` on it.
pub fn extend_observable<I, K, V>(
    target: &Object,
    options: &ObjectOptions,
    properties: I,
) -> Result<Arc<Administration>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Initializer>,
{
    let administration = as_observable_object(target, options.name.as_deref(), options.mode)?;
    for (name, value) in properties {
        administration.set_property(name.as_ref(), value)?;
    }
    Ok(administration)
}

/// A new observable object holding the entries of `properties`.
pub fn observable_object(properties: Map<String, Value>, options: &ObjectOptions) -> Result<Object> {
    let object = Object::new();
    extend_observable(&object, options, properties)?;
    Ok(object)
}

impl Object {
    /// This object's administration, if it is an observable object.
    pub fn administration(&self) -> Option<Arc<Administration>> {
        self.hidden_slot().and_then(|slot| adopt(slot).ok())
    }
}

impl Administration {
    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    /// The governed object, unless it has been dropped.
    pub fn target(&self) -> Option<Object> {
        self.target.upgrade()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.cells.read().contains_key(name)
    }

    /// The cell backing `name`.
    pub fn cell(&self, name: &str) -> Option<Cell> {
        self.cells.read().get(name).cloned()
    }

    pub fn property_count(&self) -> usize {
        self.cells.read().len()
    }

    /// Whether a change channel has been allocated.
    pub fn is_observed(&self) -> bool {
        self.channel.get().is_some()
    }

    /// Set `name` to `value`, installing the property on first write.
    ///
    /// Later writes go through the installed accessor and must be plain
    /// values; passing a computed initializer for an existing name fails
    /// with [`ObjectError::Redefinition`].
    pub fn set_property(&self, name: &str, value: impl Into<Initializer>) -> Result<()> {
        let target = self.attached_target()?;
        let value = value.into();

        if !self.has_property(name) {
            return self.install(&target, name, value);
        }
        match value {
            Initializer::Value { value, .. } => target.set(name, value),
            Initializer::Computed { .. } => Err(self.redefinition(name)),
        }
    }

    /// Install a new property. Each name can be installed once.
    pub fn define_property(&self, name: &str, value: impl Into<Initializer>) -> Result<()> {
        let target = self.attached_target()?;
        self.install(&target, name, value.into())
    }

    /// Subscribe to changes, allocating the channel on first use.
    pub fn observe<F>(&self, callback: F) -> Disposer
    where
        F: Fn(&ObjectChange) + Send + Sync + 'static,
    {
        self.channel.get_or_init(EventChannel::new).subscribe(callback)
    }

    /// Publish the event built by `change`, if anybody is listening.
    pub(crate) fn publish(&self, change: impl FnOnce() -> ObjectChange) {
        if let Some(channel) = self.channel.get() {
            channel.publish(&change());
        }
    }

    fn install(&self, target: &Object, name: &str, initializer: Initializer) -> Result<()> {
        if self.has_property(name) {
            return Err(self.redefinition(name));
        }

        let cell = Cell::new(initializer, self.mode, format!("{}.{}", self.name, name));
        target.define_property(name, Accessor::for_cell(cell.clone()))?;

        tracing::trace!(
            object = %self.name,
            property = name,
            computed = cell.is_derived(),
            "installed property"
        );
        self.cells.write().insert(name.to_owned(), cell);

        self.publish(|| ObjectChange::add(name, target.clone()));
        Ok(())
    }

    fn attached_target(&self) -> Result<Object> {
        self.target().ok_or_else(|| ObjectError::Detached {
            name: self.name.clone(),
        })
    }

    fn redefinition(&self, name: &str) -> ObjectError {
        ObjectError::Redefinition {
            object: self.name.clone(),
            name: name.to_owned(),
        }
    }
}

impl std::fmt::Debug for Administration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Administration")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("properties", &self.property_count())
            .field("observed", &self.is_observed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::property::computed;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn attaching_twice_returns_the_same_record() {
        let object = Object::new();
        let first = as_observable_object(&object, Some("Point"), ValueMode::Recursive).unwrap();
        let second = as_observable_object(&object, Some("Other"), ValueMode::Structure).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name(), "Point");
        assert_eq!(second.mode(), ValueMode::Recursive);
        assert_eq!(first.marker(), observable_object_marker());
        assert!(first.target().is_some_and(|t| t.ptr_eq(&object)));
    }

    #[test]
    fn attaching_creates_no_cells() {
        let object = Object::new();
        let administration = as_observable_object(&object, None, ValueMode::default()).unwrap();

        assert_eq!(administration.property_count(), 0);
        assert!(!administration.is_observed());
        assert!(object.own_property_names().is_empty());
        assert!(administration.name().starts_with("ObservableObject@"));
    }

    #[test]
    fn generated_names_are_unique() {
        let a = as_observable_object(&Object::new(), None, ValueMode::default()).unwrap();
        let b = as_observable_object(&Object::new(), None, ValueMode::default()).unwrap();
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn foreign_records_are_rejected() {
        struct OtherScheme;

        let object = Object::new();
        object.define_hidden(HiddenSlot::new(Marker::of::<OtherScheme>("observable array"), Arc::new(OtherScheme)));

        let err = as_observable_object(&object, None, ValueMode::default()).unwrap_err();
        assert_eq!(err, ObjectError::TypeMismatch { found: "observable array" });
        assert!(object.administration().is_none());
        assert!(!is_observable_object(&object));
    }

    #[test]
    fn type_guard_accepts_anything() {
        let object = Object::new();
        assert!(!is_observable_object(&object));
        assert!(!is_observable_object(&5));
        assert!(!is_observable_object(&()));
        assert!(!is_observable_object(&Option::<Object>::None));

        as_observable_object(&object, None, ValueMode::default()).unwrap();
        assert!(is_observable_object(&object));
    }

    #[test]
    fn cells_are_qualified_by_object_name() {
        let object = Object::new();
        let administration = as_observable_object(&object, Some("Person"), ValueMode::default()).unwrap();
        administration.set_property("age", json!(30)).unwrap();
        administration.set_property("label", computed(|| json!("adult"))).unwrap();

        assert_eq!(administration.cell("age").map(|c| c.name().to_owned()), Some("Person.age".into()));
        assert!(administration.cell("label").is_some_and(|c| c.is_derived()));
        assert_eq!(administration.property_count(), 2);
    }

    #[test]
    fn define_property_rejects_existing_names() {
        let object = Object::new();
        let administration = as_observable_object(&object, Some("Box"), ValueMode::default()).unwrap();
        administration.define_property("w", json!(1)).unwrap();

        let err = administration.define_property("w", json!(2)).unwrap_err();
        assert_eq!(
            err,
            ObjectError::Redefinition {
                object: "Box".into(),
                name: "w".into()
            }
        );
        assert_eq!(object.get("w"), Some(json!(1)));

        let err = administration.set_property("w", computed(|| json!(0))).unwrap_err();
        assert!(matches!(err, ObjectError::Redefinition { .. }));
    }

    #[test]
    fn writes_to_computed_properties_fail() {
        let object = Object::new();
        let administration = as_observable_object(&object, Some("Box"), ValueMode::default()).unwrap();
        administration.set_property("area", computed(|| json!(4))).unwrap();

        let err = administration.set_property("area", json!(5)).unwrap_err();
        assert_eq!(err, ObjectError::ComputedAssignment { name: "Box.area".into() });
    }

    #[test]
    fn observe_requires_an_observable_object() {
        let object = Object::new();
        let err = observe_object(&object, |_| {}).unwrap_err();
        assert!(matches!(err, ObjectError::Precondition { .. }));
        assert!(object.hidden_slot().is_none());
    }

    #[test]
    fn channel_is_allocated_on_first_observer() {
        let object = Object::new();
        let administration = as_observable_object(&object, None, ValueMode::default()).unwrap();
        assert!(!administration.is_observed());

        let disposer = observe_object(&object, |_| {}).unwrap();
        assert!(administration.is_observed());

        disposer.dispose();
        assert!(administration.is_observed());
    }

    #[test]
    fn add_and_update_events_are_exclusive() {
        let object = Object::new();
        let administration = as_observable_object(&object, None, ValueMode::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        administration.observe(move |change| {
            log_clone.lock().push((change.kind, change.name.clone(), change.old_value.clone()));
        });

        administration.set_property("n", json!(1)).unwrap();
        administration.set_property("n", json!(2)).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                (crate::object::ChangeKind::Add, "n".to_string(), None),
                (crate::object::ChangeKind::Update, "n".to_string(), Some(json!(1))),
            ]
        );
    }

    #[test]
    fn detached_administration_reports_error() {
        let object = Object::new();
        let administration = as_observable_object(&object, Some("Gone"), ValueMode::default()).unwrap();
        drop(object);

        let err = administration.set_property("x", json!(1)).unwrap_err();
        assert_eq!(err, ObjectError::Detached { name: "Gone".into() });
    }

    #[test]
    fn extend_observable_sets_every_entry() {
        let object = Object::new();
        let options = ObjectOptions::named("Config");
        let administration = extend_observable(
            &object,
            &options,
            vec![("a", Initializer::value(1)), ("b", computed(|| json!("b")))],
        )
        .unwrap();

        assert_eq!(administration.name(), "Config");
        assert_eq!(object.keys(), vec!["a"]);
        assert_eq!(object.get("b"), Some(json!("b")));
    }
}
