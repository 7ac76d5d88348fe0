//! Change events delivered to object observers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::target::Object;

/// What happened to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The property was installed.
    Add,
    /// An existing property was written with a different value.
    Update,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Update => "update",
        }
    }
}

/// A change to one property of an observable object.
///
/// Serializes as `{ name, object, type, oldValue? }`, where `object` is the
/// object's enumerable properties at serialization time.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectChange {
    pub name: String,
    pub object: Object,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Present for updates only.
    #[serde(rename = "oldValue", skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

impl ObjectChange {
    pub(crate) fn add(name: &str, object: Object) -> Self {
        Self {
            name: name.to_owned(),
            object,
            kind: ChangeKind::Add,
            old_value: None,
        }
    }

    pub(crate) fn update(name: &str, object: Object, old_value: Value) -> Self {
        Self {
            name: name.to_owned(),
            object,
            kind: ChangeKind::Update,
            old_value: Some(old_value),
        }
    }
}
