/*
 * builder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Schema builder.
//!
//! Walks a tag sequence with an explicit section-frame stack and produces the
//! [`ParametersSchema`] describing every input parameter. Placement of a
//! nested variable is non-local: it depends on the declared types of every
//! enclosing section. Frames whose effective type is `object`, or untyped
//! normal sections, nest their children; every other frame (boolean sections,
//! inverted sections, scalar-typed sections, dot-arrays) is a gate, and
//! variables behind gates are hoisted to the nearest nest-capable scope with a
//! `dependencies` entry recording the gating section names.

use std::collections::HashMap;

use hashlink::LinkedHashMap;
use serde_json::json;
use tracing::debug;

use formwork_schema::{
    ArrayNode, FieldSchema, ObjectNode, ParametersSchema, ScalarNode, ScalarType, SchemaError,
    SchemaNode, SchemaProvider,
};

use crate::definitions::Definition;
use crate::error::{TemplateError, TemplateResult};
use crate::render::MAX_PARTIAL_DEPTH;
use crate::tag::{Annotation, Tag, TagName, ValueType};

/// Build the parameters schema for a scanned template.
pub(crate) fn build_schema(
    tags: &[Tag],
    definitions: &LinkedHashMap<String, Definition>,
    partials: &HashMap<String, Vec<Tag>>,
    provider: Option<&dyn SchemaProvider>,
    title: &str,
    description: &str,
) -> TemplateResult<ParametersSchema> {
    debug!(tags = tags.len(), "building parameters schema");
    let mut walk = Walk {
        definitions,
        partials,
        provider,
        properties: LinkedHashMap::new(),
        required: Vec::new(),
        dependencies: LinkedHashMap::new(),
        resolved_fields: LinkedHashMap::new(),
        declared: HashMap::new(),
        frames: Vec::new(),
    };
    walk.walk(tags, 0)?;
    let schema = walk.finish(title, description);
    debug!(
        properties = schema.properties.len(),
        required = schema.required.len(),
        "parameters schema built"
    );
    Ok(schema)
}

/// Where a property lands.
#[derive(Debug, Clone, Copy)]
enum Dest {
    TopLevel,
    Frame(usize),
}

/// Transient state for one open section.
#[derive(Debug)]
struct Frame {
    name: String,
    inverted: bool,
    declared_type: Option<String>,
    /// Set when the body references `{{.}}`.
    dot_array: bool,
    item_type: ValueType,
    properties: LinkedHashMap<String, SchemaNode>,
    required: Vec<String>,
    dest: Dest,
    invert: Option<Vec<String>>,
}

impl Frame {
    /// Whether children nest under this frame rather than hoisting past it.
    fn nest_capable(&self) -> bool {
        match self.declared_type.as_deref() {
            Some("object") => true,
            Some("array") => !self.dot_array,
            Some(_) => false,
            None => !self.inverted && !self.dot_array,
        }
    }
}

struct Walk<'a> {
    definitions: &'a LinkedHashMap<String, Definition>,
    partials: &'a HashMap<String, Vec<Tag>>,
    provider: Option<&'a dyn SchemaProvider>,
    properties: LinkedHashMap<String, SchemaNode>,
    required: Vec<String>,
    dependencies: LinkedHashMap<String, Vec<String>>,
    /// Provider-resolved fields, keyed by definition name.
    resolved_fields: LinkedHashMap<String, FieldSchema>,
    /// Explicit type declarations seen so far, for conflict detection.
    declared: HashMap<String, String>,
    frames: Vec<Frame>,
}

impl Walk<'_> {
    fn walk(&mut self, tags: &[Tag], depth: usize) -> TemplateResult<()> {
        for tag in tags {
            match tag {
                Tag::Literal(_) | Tag::Comment(_) => {}
                Tag::Variable(tag_name) => self.variable(tag_name)?,
                Tag::SectionOpen(tag_name) => self.section_open(tag_name, false)?,
                Tag::InvertedOpen(tag_name) => self.section_open(tag_name, true)?,
                Tag::SectionClose(name) => self.section_close(name)?,
                Tag::Partial { name, .. } => {
                    if depth >= MAX_PARTIAL_DEPTH {
                        return Err(TemplateError::RecursivePartial {
                            name: name.clone(),
                            max_depth: MAX_PARTIAL_DEPTH,
                        });
                    }
                    let partial = self
                        .partials
                        .get(name)
                        .cloned()
                        .ok_or_else(|| TemplateError::PartialNotFound { name: name.clone() })?;
                    self.walk(&partial, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn variable(&mut self, tag_name: &TagName) -> TemplateResult<()> {
        if tag_name.is_dot() {
            if let Some(frame) = self.frames.last_mut() {
                frame.dot_array = true;
                if let Some(value_type) = tag_name.value_type() {
                    frame.item_type = value_type;
                }
            }
            return Ok(());
        }

        let name = tag_name.name.clone();
        let definition = self.definitions.get(&name).cloned();
        let (node, explicit) =
            self.node_for_variable(&name, tag_name.annotation.as_ref(), definition.as_ref())?;
        let upgrade = self.track_declaration(&name, explicit.as_deref())?;
        // The declaration map catches unannotated occurrences of a name
        // declared hidden elsewhere.
        let hidden = self.declared.get(&name).is_some_and(|kw| kw == "hidden");
        self.place(&name, node, upgrade, hidden)
    }

    fn section_open(&mut self, tag_name: &TagName, inverted: bool) -> TemplateResult<()> {
        let name = tag_name.name.clone();
        let definition = self.definitions.get(&name).cloned();
        let definition_type = definition.as_ref().and_then(|d| d.declared_type.clone());

        let declared_type = match &tag_name.annotation {
            Some(Annotation::Type(value_type)) => {
                if let Some(declared) = &definition_type {
                    if declared != value_type.keyword() {
                        return Err(conflict(&name, declared, value_type.keyword()));
                    }
                }
                Some(value_type.keyword().to_string())
            }
            Some(Annotation::External {
                schema_name,
                definition_name,
            }) => {
                let field = self.resolve_reference(&name, schema_name, definition_name)?;
                Some(field.field_type)
            }
            None => definition_type,
        };
        self.track_declaration(&name, declared_type.as_deref())?;

        let dest = self.find_dest();
        let invert = self.record_dependency(&name, dest);
        // Provisional node so the property keeps first-encounter order; the
        // real node replaces it on close.
        let mut placeholder = node_of_type(declared_type.as_deref().unwrap_or(if inverted {
            "boolean"
        } else {
            "array"
        }));
        if let Some(definition) = &definition {
            apply_definition(&mut placeholder, definition);
        }
        let gates_skipped = self.gates_skipped(dest);
        let (properties, required) = self.dest_maps(dest);
        // A previous section with the same name already contributed children;
        // seed this frame with them so duplicate sections merge.
        let seed = properties.get(&name).and_then(section_children);
        properties.entry(name.clone()).or_insert(placeholder);
        if !gates_skipped && !required.iter().any(|r| r == &name) {
            required.push(name.clone());
        }

        let (seed_properties, seed_required) = seed.unwrap_or_default();
        self.frames.push(Frame {
            name,
            inverted,
            declared_type,
            dot_array: false,
            item_type: ValueType::String,
            properties: seed_properties,
            required: seed_required,
            dest,
            invert,
        });
        Ok(())
    }

    fn section_close(&mut self, name: &str) -> TemplateResult<()> {
        let Some(frame) = self.frames.pop() else {
            // The scanner rejects unbalanced sections before the walk starts.
            unreachable!("close tag '{name}' without an open section frame");
        };
        let definition = self.definitions.get(&frame.name).cloned();
        let dest = frame.dest;
        let node = close_node(frame, definition.as_ref());
        let (properties, _) = self.dest_maps(dest);
        // Replaces the placeholder inserted at open, keeping its position.
        properties.insert(name.to_string(), node);
        Ok(())
    }

    /// Build the schema node for a plain variable, resolving external
    /// references through the provider. Returns the node and the explicit
    /// type keyword, when one was declared.
    fn node_for_variable(
        &mut self,
        name: &str,
        annotation: Option<&Annotation>,
        definition: Option<&Definition>,
    ) -> TemplateResult<(SchemaNode, Option<String>)> {
        let definition_type = definition.and_then(|d| d.declared_type.as_deref());
        let mut field: Option<FieldSchema> = None;

        let explicit: Option<String> = match annotation {
            Some(Annotation::Type(value_type)) => {
                if let Some(declared) = definition_type {
                    if declared != value_type.keyword() {
                        return Err(conflict(name, declared, value_type.keyword()));
                    }
                }
                Some(value_type.keyword().to_string())
            }
            Some(Annotation::External {
                schema_name,
                definition_name,
            }) => {
                let resolved = self.resolve_reference(name, schema_name, definition_name)?;
                if let Some(declared) = definition_type {
                    if declared != resolved.field_type {
                        return Err(conflict(name, declared, &resolved.field_type));
                    }
                }
                let field_type = resolved.field_type.clone();
                field = Some(resolved);
                Some(field_type)
            }
            None => definition_type.map(str::to_string),
        };

        let mut node = node_of_type(explicit.as_deref().unwrap_or("string"));
        if let Some(field) = &field {
            merge_field(&mut node, field);
        }
        if let Some(definition) = definition {
            apply_definition(&mut node, definition);
        }
        Ok((node, explicit))
    }

    /// Resolve `name:schemaName:defName`. A document definition carrying a
    /// declared type satisfies the reference without consulting the provider;
    /// provider results are recorded for the output schema's `definitions`.
    fn resolve_reference(
        &mut self,
        name: &str,
        schema_name: &str,
        definition_name: &str,
    ) -> TemplateResult<FieldSchema> {
        if let Some(definition) = self.definitions.get(definition_name) {
            if let Some(declared) = &definition.declared_type {
                return Ok(FieldSchema {
                    default: definition.default.clone(),
                    title: definition.title.clone(),
                    description: definition.description.clone(),
                    ..FieldSchema::of_type(declared.clone())
                });
            }
        }
        if let Some(field) = self.resolved_fields.get(definition_name) {
            return Ok(field.clone());
        }
        let provider = self.provider.ok_or_else(|| SchemaError::NoProvider {
            name: name.to_string(),
        })?;
        let field = provider.lookup(schema_name, definition_name).ok_or_else(|| {
            SchemaError::UnresolvedReference {
                name: name.to_string(),
                schema_name: schema_name.to_string(),
                definition_name: definition_name.to_string(),
            }
        })?;
        self.resolved_fields
            .insert(definition_name.to_string(), field.clone());
        Ok(field)
    }

    /// Record an explicit type declaration; two different explicit types for
    /// one name are a schema error. Returns true when this declaration is the
    /// first one (so an existing untyped property may be upgraded).
    fn track_declaration(&mut self, name: &str, explicit: Option<&str>) -> TemplateResult<bool> {
        let Some(keyword) = explicit else {
            return Ok(false);
        };
        match self.declared.get(name) {
            Some(previous) if previous != keyword => Err(conflict(name, previous, keyword)),
            Some(_) => Ok(false),
            None => {
                self.declared.insert(name.to_string(), keyword.to_string());
                Ok(true)
            }
        }
    }

    /// The nearest nest-capable frame, scanning innermost to outermost and
    /// skipping gates; top level when every enclosing frame is a gate.
    fn find_dest(&self) -> Dest {
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if frame.nest_capable() {
                return Dest::Frame(index);
            }
        }
        Dest::TopLevel
    }

    /// Whether landing at `dest` skipped over any gate frame.
    fn gates_skipped(&self, dest: Dest) -> bool {
        match dest {
            Dest::TopLevel => !self.frames.is_empty(),
            Dest::Frame(index) => index + 1 != self.frames.len(),
        }
    }

    fn dest_maps(&mut self, dest: Dest) -> (&mut LinkedHashMap<String, SchemaNode>, &mut Vec<String>) {
        match dest {
            Dest::TopLevel => (&mut self.properties, &mut self.required),
            Dest::Frame(index) => {
                let frame = &mut self.frames[index];
                (&mut frame.properties, &mut frame.required)
            }
        }
    }

    /// Record a dependency entry for a name enclosed by sections, and return
    /// the inverted gate names for hoisted properties.
    fn record_dependency(&mut self, name: &str, dest: Dest) -> Option<Vec<String>> {
        if self.frames.is_empty() {
            return None;
        }
        if !self.dependencies.contains_key(name) {
            let gates: Vec<String> = self.frames.iter().map(|f| f.name.clone()).collect();
            self.dependencies.insert(name.to_string(), gates);
        }
        if matches!(dest, Dest::TopLevel) {
            let inverted: Vec<String> = self
                .frames
                .iter()
                .filter(|f| f.inverted)
                .map(|f| f.name.clone())
                .collect();
            if !inverted.is_empty() {
                return Some(inverted);
            }
        }
        None
    }

    fn place(
        &mut self,
        name: &str,
        mut node: SchemaNode,
        upgrade: bool,
        hidden: bool,
    ) -> TemplateResult<()> {
        let dest = self.find_dest();
        if let Some(inverted) = self.record_dependency(name, dest) {
            node.annotations_mut().invert_dependency = Some(inverted);
        }
        let gates_skipped = self.gates_skipped(dest);
        let (properties, required) = self.dest_maps(dest);
        if upgrade || !properties.contains_key(name) {
            properties.insert(name.to_string(), node);
        }
        if hidden {
            // An earlier plain occurrence may already have marked the name
            // required before the hidden declaration was seen.
            required.retain(|r| r != name);
        } else if !gates_skipped && !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
        Ok(())
    }

    fn finish(mut self, title: &str, description: &str) -> ParametersSchema {
        // Names declared hidden anywhere are never required, regardless of
        // which occurrence landed them here.
        let declared = &self.declared;
        self.required
            .retain(|name| !declared.get(name).is_some_and(|kw| kw == "hidden"));

        // Dependency cleanup: names required at the top level need no entry.
        let cleaned: Vec<String> = self
            .dependencies
            .keys()
            .filter(|name| self.required.contains(name))
            .cloned()
            .collect();
        for name in cleaned {
            self.dependencies.remove(&name);
        }

        // Definition-declared names come first, in definitions document
        // order, then everything else in first-encounter order.
        let mut properties = LinkedHashMap::new();
        for name in self.definitions.keys() {
            if let Some(node) = self.properties.remove(name) {
                properties.insert(name.clone(), node);
            }
        }
        for (name, node) in std::mem::take(&mut self.properties) {
            properties.insert(name, node);
        }

        let mut definitions = LinkedHashMap::new();
        for (name, field) in &self.resolved_fields {
            let mut node = node_of_type(&field.field_type);
            merge_field(&mut node, field);
            definitions.insert(name.clone(), node);
        }

        ParametersSchema {
            title: title.to_string(),
            description: description.to_string(),
            properties,
            required: self.required,
            definitions,
            dependencies: self.dependencies,
        }
    }
}

fn conflict(name: &str, declared: &str, conflicting: &str) -> TemplateError {
    SchemaError::ConflictingType {
        name: name.to_string(),
        declared: declared.to_string(),
        conflicting: conflicting.to_string(),
    }
    .into()
}

/// A fresh node for a type keyword, with its type-appropriate default.
fn node_of_type(keyword: &str) -> SchemaNode {
    match keyword {
        "string" | "text" => SchemaNode::scalar_with_default(ScalarType::String, json!("")),
        "hidden" => {
            let mut node = ScalarNode::new(ScalarType::String);
            node.annotations.format = Some("hidden".to_string());
            node.annotations.default = Some(json!(""));
            SchemaNode::Scalar(node)
        }
        "number" => SchemaNode::scalar_with_default(ScalarType::Number, json!(0)),
        "integer" => SchemaNode::scalar_with_default(ScalarType::Integer, json!(0)),
        "boolean" => SchemaNode::scalar_with_default(ScalarType::Boolean, json!(false)),
        "array" => SchemaNode::Array(ArrayNode {
            skip_xform: false,
            items: None,
            annotations: formwork_schema::Annotations {
                default: Some(json!([])),
                ..Default::default()
            },
        }),
        "object" => SchemaNode::Object(ObjectNode::default()),
        other => SchemaNode::Scalar(ScalarNode::new(ScalarType::Named(other.to_string()))),
    }
}

/// Merge a provider field schema into a node.
fn merge_field(node: &mut SchemaNode, field: &FieldSchema) {
    let annotations = node.annotations_mut();
    annotations.minimum = field.minimum.clone();
    annotations.maximum = field.maximum.clone();
    if field.format.is_some() {
        annotations.format = field.format.clone();
    }
    if field.default.is_some() {
        annotations.default = field.default.clone();
    }
    if field.title.is_some() {
        annotations.title = field.title.clone();
    }
    if field.description.is_some() {
        annotations.description = field.description.clone();
    }
}

/// Apply definition metadata; definition values win over provider values.
fn apply_definition(node: &mut SchemaNode, definition: &Definition) {
    let annotations = node.annotations_mut();
    if definition.title.is_some() {
        annotations.title = definition.title.clone();
    }
    if definition.description.is_some() {
        annotations.description = definition.description.clone();
    }
    if definition.default.is_some() {
        annotations.default = definition.default.clone();
    }
}

/// Children carried by an existing section node, so a later section with the
/// same name extends it instead of replacing it.
fn section_children(
    node: &SchemaNode,
) -> Option<(LinkedHashMap<String, SchemaNode>, Vec<String>)> {
    match node {
        SchemaNode::Object(object) => Some((object.properties.clone(), object.required.clone())),
        SchemaNode::Array(array) => match array.items.as_deref() {
            Some(SchemaNode::Object(items)) => {
                Some((items.properties.clone(), items.required.clone()))
            }
            _ => None,
        },
        SchemaNode::Scalar(_) => None,
    }
}

/// Build the final node for a closed section frame.
fn close_node(frame: Frame, definition: Option<&Definition>) -> SchemaNode {
    let mut node = match frame.declared_type.as_deref() {
        Some("object") => SchemaNode::Object(ObjectNode {
            properties: frame.properties,
            required: frame.required,
            annotations: Default::default(),
        }),
        Some("boolean") => node_of_type("boolean"),
        Some("array") => array_node(frame.dot_array, frame.item_type, frame.properties, frame.required),
        Some(other) => node_of_type(other),
        None if frame.inverted => node_of_type("boolean"),
        None => array_node(frame.dot_array, frame.item_type, frame.properties, frame.required),
    };
    if let Some(definition) = definition {
        apply_definition(&mut node, definition);
    }
    if frame.invert.is_some() {
        node.annotations_mut().invert_dependency = frame.invert;
    }
    node
}

fn array_node(
    dot_array: bool,
    item_type: ValueType,
    properties: LinkedHashMap<String, SchemaNode>,
    required: Vec<String>,
) -> SchemaNode {
    let items = if dot_array {
        Some(Box::new(node_of_type(item_type.keyword())))
    } else if properties.is_empty() {
        None
    } else {
        Some(Box::new(SchemaNode::Object(ObjectNode {
            properties,
            required,
            annotations: Default::default(),
        })))
    };
    SchemaNode::Array(ArrayNode {
        skip_xform: dot_array,
        items,
        annotations: formwork_schema::Annotations {
            default: Some(json!([])),
            ..Default::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use formwork_schema::MemoryProvider;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn schema_for(source: &str) -> ParametersSchema {
        let tags = scan(source).unwrap();
        build_schema(&tags, &LinkedHashMap::new(), &HashMap::new(), None, "", "").unwrap()
    }

    fn schema_json(source: &str) -> Value {
        serde_json::to_value(schema_for(source)).unwrap()
    }

    #[test]
    fn test_plain_variables_required_strings() {
        let schema = schema_for("{{a}} {{b}} {{a}}");
        let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.required, vec!["a", "b"]);
        assert_eq!(
            serde_json::to_value(schema.properties.get("a").unwrap()).unwrap(),
            serde_json::json!({ "type": "string", "default": "" })
        );
    }

    #[test]
    fn test_untyped_section_nests_children() {
        let value = schema_json("{{#section}}{{foo}}{{/section}}");
        assert_eq!(value["required"], serde_json::json!(["section"]));
        assert_eq!(value["properties"]["section"]["type"], "array");
        assert_eq!(
            value["properties"]["section"]["items"]["required"],
            serde_json::json!(["foo"])
        );
        assert!(value["properties"]["section"]["items"]["properties"]["foo"].is_object());
        assert!(value["properties"].get("foo").is_none());
        // residual dependency entry, kept for compatibility
        assert_eq!(value["dependencies"]["foo"], serde_json::json!(["section"]));
    }

    #[test]
    fn test_dot_array_section() {
        let value = schema_json("{{#section}}{{.}}{{/section}}");
        assert_eq!(
            value["properties"]["section"],
            serde_json::json!({
                "type": "array",
                "skip_xform": true,
                "items": { "type": "string", "default": "" },
                "default": []
            })
        );
        assert!(value.get("dependencies").is_none());
    }

    #[test]
    fn test_typed_dot_array_section() {
        let value = schema_json("{{#ports}}{{.::integer}}{{/ports}}");
        assert_eq!(value["properties"]["ports"]["items"]["type"], "integer");
    }

    #[test]
    fn test_boolean_section_hoists() {
        let mut definitions = LinkedHashMap::new();
        definitions.insert(
            "section".to_string(),
            Definition {
                declared_type: Some("boolean".to_string()),
                ..Definition::default()
            },
        );
        let tags = scan("{{#section}}{{foo}}{{/section}}").unwrap();
        let schema =
            build_schema(&tags, &definitions, &HashMap::new(), None, "", "").unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["properties"]["section"]["type"], "boolean");
        assert!(value["properties"]["foo"].is_object());
        assert_eq!(schema.required, vec!["section"]);
        assert_eq!(value["dependencies"]["foo"], serde_json::json!(["section"]));
    }

    #[test]
    fn test_boolean_suffix_section_hoists() {
        let value = schema_json("{{#section::boolean}}{{foo}}{{/section}}");
        assert_eq!(value["properties"]["section"]["type"], "boolean");
        assert!(value["properties"]["foo"].is_object());
        assert_eq!(value["dependencies"]["foo"], serde_json::json!(["section"]));
    }

    #[test]
    fn test_object_section_nests_and_keeps_dependency() {
        let mut definitions = LinkedHashMap::new();
        definitions.insert(
            "section".to_string(),
            Definition {
                declared_type: Some("object".to_string()),
                ..Definition::default()
            },
        );
        let tags = scan("{{#section}}{{foo}}{{/section}}").unwrap();
        let schema =
            build_schema(&tags, &definitions, &HashMap::new(), None, "", "").unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["properties"]["section"]["type"], "object");
        assert_eq!(
            value["properties"]["section"]["required"],
            serde_json::json!(["foo"])
        );
        assert!(value["properties"].get("foo").is_none());
        assert_eq!(value["dependencies"]["foo"], serde_json::json!(["section"]));
    }

    #[test]
    fn test_nested_inverted_sections_dependency_order() {
        let value = schema_json("{{^a}}{{^b}}{{val}}{{/b}}{{/a}}");
        assert_eq!(value["dependencies"]["val"], serde_json::json!(["a", "b"]));
        assert_eq!(
            value["properties"]["val"]["invertDependency"],
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn test_dependency_cleanup_for_required_names() {
        let value = schema_json("{{app_name}}{{#do_foo}}{{app_name}}_foo{{/do_foo}}");
        assert!(value.get("dependencies").is_none());
        let required = value["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("app_name")));
    }

    #[test]
    fn test_hidden_never_required() {
        let schema = schema_for("{{secret::hidden}}");
        assert!(schema.required.is_empty());
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value["properties"]["secret"],
            serde_json::json!({ "type": "string", "format": "hidden", "default": "" })
        );
    }

    #[test]
    fn test_hidden_declaration_order_does_not_matter() {
        // plain occurrence first, hidden declaration later
        let schema = schema_for("{{secret}} {{secret::hidden}}");
        assert!(schema.required.is_empty());
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["properties"]["secret"]["format"], "hidden");

        // hidden declaration first, plain occurrence later
        let schema = schema_for("{{secret::hidden}} {{secret}}");
        assert!(schema.required.is_empty());
    }

    #[test]
    fn test_duplicate_sections_merge_children() {
        let value = schema_json("{{#s}}{{a}}{{/s}}{{#s}}{{b}}{{/s}}");
        let items = &value["properties"]["s"]["items"];
        assert!(items["properties"]["a"].is_object());
        assert!(items["properties"]["b"].is_object());
        assert_eq!(items["required"], serde_json::json!(["a", "b"]));
        assert_eq!(value["required"], serde_json::json!(["s"]));
    }

    #[test]
    fn test_conflicting_suffix_types() {
        let tags = scan("{{port::integer}}{{port::string}}").unwrap();
        let err =
            build_schema(&tags, &LinkedHashMap::new(), &HashMap::new(), None, "", "").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Schema(SchemaError::ConflictingType { .. })
        ));
    }

    #[test]
    fn test_external_reference_without_provider() {
        let tags = scan("{{virtual_port:types:port}}").unwrap();
        let err =
            build_schema(&tags, &LinkedHashMap::new(), &HashMap::new(), None, "", "").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Schema(SchemaError::NoProvider { .. })
        ));
    }

    #[test]
    fn test_external_reference_miss_is_fatal() {
        let provider = MemoryProvider::new();
        let tags = scan("{{virtual_port:types:port}}").unwrap();
        let err = build_schema(
            &tags,
            &LinkedHashMap::new(),
            &HashMap::new(),
            Some(&provider),
            "",
            "",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Schema(SchemaError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_external_reference_merge_and_definitions_output() {
        let provider = MemoryProvider::with_definitions([(
            "types",
            "port",
            FieldSchema {
                default: Some(serde_json::json!(443)),
                minimum: Some(serde_json::Number::from(0)),
                maximum: Some(serde_json::Number::from(65535)),
                ..FieldSchema::of_type("integer")
            },
        )]);
        let tags = scan("{{virtual_port:types:port}}").unwrap();
        let schema = build_schema(
            &tags,
            &LinkedHashMap::new(),
            &HashMap::new(),
            Some(&provider),
            "",
            "",
        )
        .unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value["properties"]["virtual_port"],
            serde_json::json!({
                "type": "integer",
                "minimum": 0,
                "maximum": 65535,
                "default": 443
            })
        );
        assert_eq!(value["definitions"]["port"]["type"], "integer");
    }

    #[test]
    fn test_property_order_definitions_first() {
        let mut definitions = LinkedHashMap::new();
        definitions.insert(
            "foo".to_string(),
            Definition {
                title: Some("Foo".to_string()),
                ..Definition::default()
            },
        );
        definitions.insert(
            "baz".to_string(),
            Definition {
                title: Some("Baz".to_string()),
                ..Definition::default()
            },
        );
        let tags = scan("{{bar}}{{baz}}{{foo}}{{other}}").unwrap();
        let schema =
            build_schema(&tags, &definitions, &HashMap::new(), None, "", "").unwrap();
        let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["foo", "baz", "bar", "other"]);
    }

    #[test]
    fn test_partial_splice_reaches_schema() {
        let mut partials = HashMap::new();
        partials.insert("part".to_string(), scan("{{^a}}{{^b}}{{value}}{{/b}}{{/a}}").unwrap());
        let tags = scan("{{> part}}").unwrap();
        let schema =
            build_schema(&tags, &LinkedHashMap::new(), &partials, None, "", "").unwrap();
        assert_eq!(
            schema.dependencies.get("value"),
            Some(&vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_recursive_partial_guard() {
        let mut partials = HashMap::new();
        partials.insert("loop".to_string(), scan("{{> loop}}").unwrap());
        let tags = scan("{{> loop}}").unwrap();
        let err =
            build_schema(&tags, &LinkedHashMap::new(), &partials, None, "", "").unwrap_err();
        assert!(matches!(err, TemplateError::RecursivePartial { .. }));
    }

    #[test]
    fn test_missing_partial_is_fatal() {
        let tags = scan("{{> nowhere}}").unwrap();
        let err =
            build_schema(&tags, &LinkedHashMap::new(), &HashMap::new(), None, "", "").unwrap_err();
        assert!(matches!(err, TemplateError::PartialNotFound { .. }));
    }
}
