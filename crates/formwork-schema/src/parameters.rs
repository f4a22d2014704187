//! Top-level parameters schema artifact.

use hashlink::LinkedHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::node::SchemaNode;

/// The schema describing every input parameter a template needs.
///
/// Serializes as a JSON Schema object:
/// `{type: "object", properties, required, title, description, definitions}`
/// plus a `dependencies` map when any field is conditionally meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametersSchema {
    pub title: String,
    pub description: String,
    /// Ordered field map: definition-declared names first, then first
    /// encounter order in the template.
    pub properties: LinkedHashMap<String, SchemaNode>,
    pub required: Vec<String>,
    /// Provider-resolved definitions, keyed by definition name.
    pub definitions: LinkedHashMap<String, SchemaNode>,
    /// Field name to the gating section names it depends on, outer-to-inner.
    pub dependencies: LinkedHashMap<String, Vec<String>>,
}

impl ParametersSchema {
    /// Collect the default value of every property that declares one.
    pub fn default_parameters(&self) -> serde_json::Map<String, Value> {
        let mut defaults = serde_json::Map::new();
        for (name, node) in &self.properties {
            if let Some(default) = &node.annotations().default {
                defaults.insert(name.clone(), default.clone());
            }
        }
        defaults
    }
}

impl Serialize for ParametersSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &self.properties)?;
        map.serialize_entry("required", &self.required)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("description", &self.description)?;
        map.serialize_entry("definitions", &self.definitions)?;
        if !self.dependencies.is_empty() {
            map.serialize_entry("dependencies", &self.dependencies)?;
        }
        map.end()
    }
}
