//! Schema node tree.
//!
//! A [`SchemaNode`] is one field of a parameters schema. The tree mirrors JSON
//! Schema: scalars carry a primitive type, arrays carry an `items` node,
//! objects carry ordered `properties` plus a `required` list. Serialization is
//! hand-written so the emitted JSON keeps a stable key order and omits unset
//! annotations.

use hashlink::LinkedHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

/// Metadata shared by every schema node kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub format: Option<String>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    /// Names of the inverted sections a hoisted field is gated by,
    /// outer-to-inner.
    pub invert_dependency: Option<Vec<String>>,
}

/// Primitive type of a scalar node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    /// A type name taken verbatim from a definition or provider that does not
    /// map onto one of the primitives above.
    Named(String),
}

impl ScalarType {
    pub fn as_str(&self) -> &str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Boolean => "boolean",
            ScalarType::Named(name) => name,
        }
    }
}

/// A scalar-typed field.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarNode {
    pub scalar_type: ScalarType,
    pub annotations: Annotations,
}

impl ScalarNode {
    pub fn new(scalar_type: ScalarType) -> Self {
        Self {
            scalar_type,
            annotations: Annotations::default(),
        }
    }
}

/// An array-typed field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayNode {
    /// Set for dot-array sections; consumers render these verbatim instead of
    /// transforming each element.
    pub skip_xform: bool,
    pub items: Option<Box<SchemaNode>>,
    pub annotations: Annotations,
}

/// An object-typed field with ordered properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    pub properties: LinkedHashMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub annotations: Annotations,
}

/// One field of a parameters schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Scalar(ScalarNode),
    Array(ArrayNode),
    Object(ObjectNode),
}

impl SchemaNode {
    /// Convenience constructor for a scalar node with a default value.
    pub fn scalar_with_default(scalar_type: ScalarType, default: Value) -> Self {
        let mut node = ScalarNode::new(scalar_type);
        node.annotations.default = Some(default);
        SchemaNode::Scalar(node)
    }

    /// The JSON Schema type name of this node.
    pub fn type_name(&self) -> &str {
        match self {
            SchemaNode::Scalar(node) => node.scalar_type.as_str(),
            SchemaNode::Array(_) => "array",
            SchemaNode::Object(_) => "object",
        }
    }

    pub fn annotations(&self) -> &Annotations {
        match self {
            SchemaNode::Scalar(node) => &node.annotations,
            SchemaNode::Array(node) => &node.annotations,
            SchemaNode::Object(node) => &node.annotations,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        match self {
            SchemaNode::Scalar(node) => &mut node.annotations,
            SchemaNode::Array(node) => &mut node.annotations,
            SchemaNode::Object(node) => &mut node.annotations,
        }
    }
}

fn serialize_annotations<M: SerializeMap>(
    map: &mut M,
    annotations: &Annotations,
) -> Result<(), M::Error> {
    if let Some(format) = &annotations.format {
        map.serialize_entry("format", format)?;
    }
    if let Some(minimum) = &annotations.minimum {
        map.serialize_entry("minimum", minimum)?;
    }
    if let Some(maximum) = &annotations.maximum {
        map.serialize_entry("maximum", maximum)?;
    }
    if let Some(title) = &annotations.title {
        map.serialize_entry("title", title)?;
    }
    if let Some(description) = &annotations.description {
        map.serialize_entry("description", description)?;
    }
    if let Some(default) = &annotations.default {
        map.serialize_entry("default", default)?;
    }
    if let Some(invert) = &annotations.invert_dependency {
        map.serialize_entry("invertDependency", invert)?;
    }
    Ok(())
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaNode::Scalar(node) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", node.scalar_type.as_str())?;
                serialize_annotations(&mut map, &node.annotations)?;
                map.end()
            }
            SchemaNode::Array(node) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "array")?;
                if node.skip_xform {
                    map.serialize_entry("skip_xform", &true)?;
                }
                if let Some(items) = &node.items {
                    map.serialize_entry("items", items.as_ref())?;
                }
                serialize_annotations(&mut map, &node.annotations)?;
                map.end()
            }
            SchemaNode::Object(node) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "object")?;
                map.serialize_entry("properties", &node.properties)?;
                map.serialize_entry("required", &node.required)?;
                serialize_annotations(&mut map, &node.annotations)?;
                map.end()
            }
        }
    }
}
