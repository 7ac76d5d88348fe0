//! Property installation: from an initial value to a governed accessor.
//!
//! An [`Initializer`] says what a new property should be. [`Cell::new`]
//! turns it into one of two cell variants, chosen once:
//!
//! - a computed initializer becomes a [`Cell::Derived`] over a [`Memo`],
//!   comparing results structurally only when wrapped with [`as_structure`];
//! - anything else becomes a [`Cell::Value`] over a [`Signal`], compared
//!   according to the property's [`ValueMode`].
//!
//! The cell is then wrapped in an [`Accessor`] and placed on the target.
//! Reads go straight to the cell; writes compare, store, and publish an
//! update event when the value changed and somebody is observing.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::change::ObjectChange;
use super::mode::{identity_eq, structural_eq, ValueMode};
use super::target::{Object, PropertyDescriptor};
use crate::error::{ObjectError, Result};
use crate::reactive::{Comparer, Memo, ReactiveContext, Signal};

/// A zero-argument derivation producing a property value.
pub type Derivation = Arc<dyn Fn() -> Value + Send + Sync>;

/// The initial value of a property, which also selects its cell variant.
#[derive(Clone)]
pub enum Initializer {
    /// A stored value. `mode` overrides the administration's default.
    Value {
        value: Value,
        mode: Option<ValueMode>,
    },
    /// A derived value.
    Computed { derive: Derivation, structural: bool },
}

impl Initializer {
    /// A stored value under the administration's default mode.
    pub fn value(value: impl Into<Value>) -> Self {
        Initializer::Value {
            value: value.into(),
            mode: None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Initializer::Computed { .. })
    }
}

impl From<Value> for Initializer {
    fn from(value: Value) -> Self {
        Initializer::value(value)
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initializer::Value { value, mode } => f
                .debug_struct("Value")
                .field("value", value)
                .field("mode", mode)
                .finish(),
            Initializer::Computed { structural, .. } => f
                .debug_struct("Computed")
                .field("structural", structural)
                .finish_non_exhaustive(),
        }
    }
}

/// A computed property.
///
/// Every recomputation counts as a change unless it returns the same scalar.
pub fn computed<F>(derive: F) -> Initializer
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    Initializer::Computed {
        derive: Arc::new(derive),
        structural: false,
    }
}

/// A computed property whose results are compared by content.
pub fn as_structure<F>(derive: F) -> Initializer
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    Initializer::Computed {
        derive: Arc::new(derive),
        structural: true,
    }
}

/// A stored property with its own value mode.
pub fn with_mode(value: impl Into<Value>, mode: ValueMode) -> Initializer {
    Initializer::Value {
        value: value.into(),
        mode: Some(mode),
    }
}

/// The reactive cell backing one property.
#[derive(Debug, Clone)]
pub enum Cell {
    Value(Signal<Value>),
    Derived(Memo<Value>),
}

impl Cell {
    /// Build the cell for `initializer`, named `name` for diagnostics.
    pub fn new(initializer: Initializer, default_mode: ValueMode, name: String) -> Self {
        match initializer {
            Initializer::Computed { derive, structural } => {
                let comparer: Comparer<Value> = if structural { structural_eq } else { identity_eq };
                Cell::Derived(Memo::with_comparer(move || derive(), comparer).named(name))
            }
            Initializer::Value { value, mode } => {
                let comparer = mode.unwrap_or(default_mode).comparer();
                Cell::Value(Signal::with_comparer(value, comparer).named(name))
            }
        }
    }

    pub fn get(&self) -> Value {
        match self {
            Cell::Value(signal) => signal.get(),
            Cell::Derived(memo) => memo.get(),
        }
    }

    /// Write through the cell. Returns whether the stored value changed.
    ///
    /// Derived cells are read-only.
    pub fn set(&self, value: Value) -> Result<bool> {
        match self {
            Cell::Value(signal) => Ok(signal.set(value)),
            Cell::Derived(memo) => Err(ObjectError::ComputedAssignment {
                name: memo.name().to_owned(),
            }),
        }
    }

    /// Qualified name, `"<object>.<property>"`.
    pub fn name(&self) -> &str {
        match self {
            Cell::Value(signal) => signal.name(),
            Cell::Derived(memo) => memo.name(),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Cell::Derived(_))
    }
}

/// The get/set pair installed on a target for one property.
#[derive(Debug, Clone)]
pub(crate) struct Accessor {
    pub(crate) cell: Cell,
    pub(crate) enumerable: bool,
    pub(crate) configurable: bool,
}

impl Accessor {
    /// Computed properties are hidden from enumeration; they hold derived,
    /// not stored, data.
    pub(crate) fn for_cell(cell: Cell) -> Self {
        Self {
            enumerable: !cell.is_derived(),
            configurable: true,
            cell,
        }
    }

    pub(crate) fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            enumerable: self.enumerable,
            configurable: self.configurable,
            computed: self.cell.is_derived(),
        }
    }

    pub(crate) fn read(&self) -> Value {
        self.cell.get()
    }

    pub(crate) fn write(&self, target: &Object, name: &str, value: Value) -> Result<()> {
        let old_value = ReactiveContext::untracked(|| self.cell.get());
        if !self.cell.set(value)? {
            return Ok(());
        }

        tracing::trace!(property = %self.cell.name(), "property updated");
        if let Some(administration) = target.administration() {
            administration.publish(|| ObjectChange::update(name, target.clone(), old_value));
        }
        Ok(())
    }
}
