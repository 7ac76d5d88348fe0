//! Value modes: how a stored property value is compared on write.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reactive::Comparer;

/// Wrapping strategy for plain (non-computed) properties.
///
/// The administration hands its mode to every value cell it creates unless
/// the property was initialized with [`with_mode`](super::with_mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Deep reactivity. Nested values are stored as given.
    #[default]
    Recursive,

    /// Store the value as a reference.
    Reference,

    /// Compare values by content, so rebuilding an equal array or object
    /// is not a change.
    Structure,

    /// Shallow reactivity.
    Flat,
}

impl ValueMode {
    /// The equality policy value cells use under this mode.
    pub fn comparer(self) -> Comparer<Value> {
        match self {
            ValueMode::Structure => structural_eq,
            ValueMode::Recursive | ValueMode::Reference | ValueMode::Flat => identity_eq,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueMode::Recursive => "recursive",
            ValueMode::Reference => "reference",
            ValueMode::Structure => "structure",
            ValueMode::Flat => "flat",
        }
    }
}

/// Scalars compare by value; every array or object write is a fresh value.
pub fn identity_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_), _) | (Value::Object(_), _) => false,
        _ => a == b,
    }
}

/// Deep content comparison.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    a == b
}
