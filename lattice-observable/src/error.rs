//! Error types for observable objects.

use thiserror::Error;

/// Errors raised while administering or writing observable objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// The object already carries a record from a different scheme.
    #[error("the given object is observable ({found}) but not an observable object")]
    TypeMismatch { found: &'static str },

    /// An operation required an observable object and got something else.
    #[error("precondition failed: {message}")]
    Precondition { message: &'static str },

    /// A property name was installed twice on the same administration.
    #[error("property '{name}' is already defined on {object}")]
    Redefinition { object: String, name: String },

    /// Computed properties are read-only.
    #[error("cannot assign a new value to computed property '{name}'")]
    ComputedAssignment { name: String },

    #[error("property '{name}' is not defined")]
    UnknownProperty { name: String },

    #[error("property '{name}' is not configurable")]
    NotConfigurable { name: String },

    /// The administration outlived the object it governs.
    #[error("the object administered as '{name}' no longer exists")]
    Detached { name: String },
}

/// Result alias defaulting to [`ObjectError`].
pub type Result<T, E = ObjectError> = std::result::Result<T, E>;
