//! River reach identifiers and the map features that carry them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute names checked, in order, for a reach identifier.
pub const REACH_ID_ATTRIBUTES: [&str; 2] = ["COMID", "reach_id"];

const UNNAMED_RIVER: &str = "UNNAMED RIVER";

/// Non-empty reach identifier (NHDPlus COMID / NWM reach id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReachId(String);

impl ReachId {
    /// Returns `None` when `id` is empty after trimming.
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let trimmed = id.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A selectable flowline feature with its attribute table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReachFeature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ReachFeature {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            properties,
        }
    }

    /// First non-empty value among [`REACH_ID_ATTRIBUTES`].
    pub fn reach_id(&self) -> Option<ReachId> {
        REACH_ID_ATTRIBUTES
            .iter()
            .filter_map(|name| self.properties.get(*name))
            .find_map(attribute_as_id)
    }

    /// River name for display; the `NODATA` placeholder becomes "UNNAMED RIVER".
    pub fn display_name(&self) -> String {
        match self.properties.get("river_name").and_then(Value::as_str) {
            Some("NODATA") | None => UNNAMED_RIVER.to_string(),
            Some(name) => name.to_string(),
        }
    }
}

fn attribute_as_id(value: &Value) -> Option<ReachId> {
    match value {
        Value::String(s) => ReachId::new(s),
        Value::Number(n) => ReachId::new(n.to_string()),
        _ => None,
    }
}
