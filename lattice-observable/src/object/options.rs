//! Options for building observable objects.

use serde::{Deserialize, Serialize};

use super::mode::ValueMode;

/// How a new observable object is named and how its plain properties are
/// compared.
///
/// Missing fields take their defaults when deserializing, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectOptions {
    /// Base name for diagnostics. Generated when absent.
    pub name: Option<String>,
    pub mode: ValueMode,
}

impl ObjectOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
