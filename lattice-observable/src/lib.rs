//! Lattice Observable
//!
//! Observable objects for the Lattice reactive UI framework. An ordinary
//! object is converted, property by property, into one whose fields are
//! backed by reactive cells:
//!
//! - Stored properties are signals; computed properties are memos
//! - Reads take part in automatic dependency tracking
//! - Writes that change a value emit `add`/`update` change events
//! - Change channels are only allocated once somebody observes
//!
//! # Architecture
//!
//! - `reactive`: Signals, memos, dependency tracking, and event channels
//! - `object`: Target objects, administrations, and property installation
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_observable::object::{as_observable_object, observe_object, Object, ValueMode};
//! use serde_json::json;
//!
//! let todo = Object::new();
//! let adm = as_observable_object(&todo, Some("Todo"), ValueMode::default())?;
//! adm.set_property("done", json!(false))?;
//!
//! let disposer = observe_object(&todo, |change| {
//!     println!("{}: {:?} -> {:?}", change.name, change.old_value, change.object.get(&change.name));
//! })?;
//!
//! adm.set_property("done", json!(true))?; // prints "done: Some(Bool(false)) -> Some(Bool(true))"
//! disposer.dispose();
//! ```

pub mod object;
pub mod reactive;

mod error;

pub use error::{ObjectError, Result};
