//! Target Objects
//!
//! An [`Object`] is a dynamic bag of named properties. It starts empty and
//! ungoverned; an administration installs accessors on it one property at a
//! time.
//!
//! Besides its properties an object has exactly one hidden slot. A scheme
//! that takes over an object stores its record there, tagged with a
//! [`Marker`]. The slot can be filled once and is never listed among the
//! object's properties.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::property::Accessor;
use crate::error::{ObjectError, Result};

/// Identifies which scheme produced the record in an object's hidden slot.
///
/// Two markers are equal when they were made for the same record type.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    scheme: &'static str,
    tag: TypeId,
}

impl Marker {
    /// Marker for records of type `R`, described as `scheme` in errors.
    pub fn of<R: Any>(scheme: &'static str) -> Self {
        Self {
            scheme,
            tag: TypeId::of::<R>(),
        }
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Marker {}

/// Contents of an object's hidden slot.
#[derive(Clone)]
pub struct HiddenSlot {
    marker: Marker,
    record: Arc<dyn Any + Send + Sync>,
}

impl HiddenSlot {
    pub fn new<R: Any + Send + Sync>(marker: Marker, record: Arc<R>) -> Self {
        Self { marker, record }
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// The record, if it has type `R`.
    pub fn downcast<R: Any + Send + Sync>(&self) -> Option<Arc<R>> {
        Arc::clone(&self.record).downcast::<R>().ok()
    }
}

impl fmt::Debug for HiddenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiddenSlot")
            .field("scheme", &self.marker.scheme)
            .finish_non_exhaustive()
    }
}

/// How a property is exposed on its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Listed by [`Object::keys`] and included in serialization.
    pub enumerable: bool,
    /// May be replaced by a later definition.
    pub configurable: bool,
    /// Backed by a derived cell.
    pub computed: bool,
}

fn next_object_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct ObjectInner {
    id: u64,
    hidden: OnceLock<HiddenSlot>,
    properties: RwLock<IndexMap<String, Accessor>>,
}

/// A shared handle to a target object.
///
/// Clones refer to the same object. Closures stored inside the object (such
/// as computed properties) should capture a [`WeakObject`] to avoid keeping
/// it alive through itself.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

/// A non-owning reference to an [`Object`].
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Object {
    /// Create an empty, ungoverned object.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: next_object_id(),
                hidden: OnceLock::new(),
                properties: RwLock::new(IndexMap::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn hidden_slot(&self) -> Option<&HiddenSlot> {
        self.inner.hidden.get()
    }

    /// Fill the hidden slot unless it is already taken.
    ///
    /// Returns whatever the slot holds afterwards; a slot that was already
    /// filled keeps its original record.
    pub fn define_hidden(&self, slot: HiddenSlot) -> &HiddenSlot {
        self.inner.hidden.get_or_init(|| slot)
    }

    /// Read a property. `None` if it is not defined.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.accessor(name).map(|accessor| accessor.read())
    }

    /// Write an existing property through its accessor.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let accessor = self
            .accessor(name)
            .ok_or_else(|| ObjectError::UnknownProperty {
                name: name.to_owned(),
            })?;
        accessor.write(self, name, value.into())
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.properties.read().contains_key(name)
    }

    /// Names of the enumerable properties, in definition order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .properties
            .read()
            .iter()
            .filter(|(_, accessor)| accessor.enumerable)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of all properties, enumerable or not.
    pub fn own_property_names(&self) -> Vec<String> {
        self.inner.properties.read().keys().cloned().collect()
    }

    pub fn descriptor(&self, name: &str) -> Option<PropertyDescriptor> {
        self.inner
            .properties
            .read()
            .get(name)
            .map(Accessor::descriptor)
    }

    /// The enumerable properties as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.enumerable_entries().into_iter().collect())
    }

    /// Install `accessor` at `name`, replacing a configurable one.
    pub(crate) fn define_property(&self, name: &str, accessor: Accessor) -> Result<()> {
        let mut properties = self.inner.properties.write();
        if let Some(existing) = properties.get(name) {
            if !existing.configurable {
                return Err(ObjectError::NotConfigurable {
                    name: name.to_owned(),
                });
            }
        }
        properties.insert(name.to_owned(), accessor);
        Ok(())
    }

    // Accessors are cloned out so no lock is held while a cell computes.
    fn accessor(&self, name: &str) -> Option<Accessor> {
        self.inner.properties.read().get(name).cloned()
    }

    fn enumerable_entries(&self) -> Vec<(String, Value)> {
        let accessors: Vec<(String, Accessor)> = self
            .inner
            .properties
            .read()
            .iter()
            .filter(|(_, accessor)| accessor.enumerable)
            .map(|(name, accessor)| (name.clone(), accessor.clone()))
            .collect();

        accessors
            .into_iter()
            .map(|(name, accessor)| (name, accessor.read()))
            .collect()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("properties", &self.own_property_names())
            .field("hidden", &self.hidden_slot())
            .finish()
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.enumerable_entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in &entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
