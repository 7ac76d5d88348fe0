//! Observable Objects
//!
//! This module turns a plain [`Object`] into an observable object, one
//! property at a time. Each property is backed by a cell from
//! [`crate::reactive`]: a [`Signal`](crate::reactive::Signal) for stored
//! values, a [`Memo`](crate::reactive::Memo) for computed ones. Reads take
//! part in dependency tracking, so computed properties follow the
//! properties they read.
//!
//! # Concepts
//!
//! ## Administration
//!
//! Every observable object carries exactly one [`Administration`] in its
//! hidden slot. It maps property names to cells and, once somebody
//! observes the object, owns the channel change events go through.
//!
//! ## Properties
//!
//! [`Administration::set_property`] is the single write entry point. The
//! first write to a name installs the property and emits an `add` event;
//! every later write goes through the installed accessor and emits an
//! `update` event carrying the old value, but only if the cell reports a
//! change.
//!
//! ## Observation
//!
//! [`observe_object`] subscribes to all `add` and `update` events of one
//! object. Events are delivered synchronously, in order, from within the
//! write that caused them.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_observable::object::*;
//! use serde_json::json;
//!
//! let point = Object::new();
//! let adm = as_observable_object(&point, Some("Point"), ValueMode::default())?;
//! adm.set_property("x", json!(1))?;
//!
//! let weak = point.downgrade();
//! adm.set_property("double", computed(move || {
//!     let x = weak.upgrade().and_then(|p| p.get("x")).and_then(|v| v.as_i64());
//!     json!(x.unwrap_or(0) * 2)
//! }))?;
//!
//! observe_object(&point, |change| println!("{} {}", change.kind.as_str(), change.name))?;
//! adm.set_property("x", json!(5))?; // prints "update x"
//! assert_eq!(point.get("double"), Some(json!(10)));
//! ```

mod administration;
mod change;
mod mode;
mod options;
mod property;
mod target;

pub use administration::{
    as_observable_object, extend_observable, is_observable_object, observable_object,
    observable_object_marker, observe_object, Administration,
};
pub use change::{ChangeKind, ObjectChange};
pub use mode::{identity_eq, structural_eq, ValueMode};
pub use options::ObjectOptions;
pub use property::{as_structure, computed, with_mode, Cell, Derivation, Initializer};
pub use target::{HiddenSlot, Marker, Object, PropertyDescriptor, WeakObject};
