//! Parameter validation against a derived schema.
//!
//! Checks a supplied parameters object for missing required fields, type
//! mismatches, numeric bounds, and unsatisfied property dependencies. Errors
//! are accumulated rather than short-circuited so the caller sees every
//! offending field at once.

use serde_json::Value;

use crate::error::{ParameterError, ParameterErrors};
use crate::node::{ArrayNode, ObjectNode, ScalarNode, ScalarType, SchemaNode};
use crate::parameters::ParametersSchema;

/// Validate a parameters object against a schema.
///
/// Parameters not mentioned by the schema are ignored; templates tolerate
/// extra view values.
pub fn validate_parameters(
    schema: &ParametersSchema,
    parameters: &serde_json::Map<String, Value>,
) -> Result<(), ParameterErrors> {
    let mut context = ValidationContext::new();

    for name in &schema.required {
        if !parameters.contains_key(name) {
            context.error(name.clone(), "missing required parameter");
        }
    }

    for (name, node) in &schema.properties {
        if let Some(value) = parameters.get(name) {
            context.push(name);
            validate_node(value, node, &mut context);
            context.pop();
        }
    }

    // JSON Schema property dependencies: supplying a gated field requires
    // supplying each of its gates as well.
    for (name, gates) in &schema.dependencies {
        if parameters.contains_key(name) {
            for gate in gates {
                if !parameters.contains_key(gate) {
                    context.error(name.clone(), format!("depends on missing parameter '{gate}'"));
                }
            }
        }
    }

    context.finish()
}

/// Accumulates errors along with the instance path being validated.
struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ParameterError>,
}

impl ValidationContext {
    fn new() -> Self {
        Self {
            path: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    fn pop(&mut self) {
        self.path.pop();
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let path = self.path.join(".");
        self.errors.push(ParameterError {
            path,
            message: message.into(),
        });
    }

    fn error(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(ParameterError {
            path,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ParameterErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ParameterErrors {
                errors: self.errors,
            })
        }
    }
}

fn validate_node(value: &Value, node: &SchemaNode, context: &mut ValidationContext) {
    match node {
        SchemaNode::Scalar(scalar) => validate_scalar(value, scalar, context),
        SchemaNode::Array(array) => validate_array(value, array, context),
        SchemaNode::Object(object) => validate_object(value, object, context),
    }
}

fn validate_scalar(value: &Value, scalar: &ScalarNode, context: &mut ValidationContext) {
    match &scalar.scalar_type {
        ScalarType::String => {
            if !value.is_string() {
                context.error_here("expected string");
            }
        }
        ScalarType::Number => {
            if !value.is_number() {
                context.error_here("expected number");
            }
        }
        ScalarType::Integer => {
            if !value.is_i64() && !value.is_u64() {
                context.error_here("expected integer");
            }
        }
        ScalarType::Boolean => {
            if !value.is_boolean() {
                context.error_here("expected boolean");
            }
        }
        // Verbatim named types carry no local validation rules.
        ScalarType::Named(_) => {}
    }

    if let Some(actual) = value.as_f64() {
        if let Some(minimum) = scalar.annotations.minimum.as_ref().and_then(|n| n.as_f64()) {
            if actual < minimum {
                context.error_here(format!("value below minimum {minimum}"));
            }
        }
        if let Some(maximum) = scalar.annotations.maximum.as_ref().and_then(|n| n.as_f64()) {
            if actual > maximum {
                context.error_here(format!("value above maximum {maximum}"));
            }
        }
    }
}

fn validate_array(value: &Value, array: &ArrayNode, context: &mut ValidationContext) {
    let Some(elements) = value.as_array() else {
        context.error_here("expected array");
        return;
    };
    if let Some(items) = &array.items {
        for (index, element) in elements.iter().enumerate() {
            context.push(format!("[{index}]"));
            validate_node(element, items, context);
            context.pop();
        }
    }
}

fn validate_object(value: &Value, object: &ObjectNode, context: &mut ValidationContext) {
    let Some(fields) = value.as_object() else {
        context.error_here("expected object");
        return;
    };
    for name in &object.required {
        if !fields.contains_key(name) {
            context.push(name);
            context.error_here("missing required parameter");
            context.pop();
        }
    }
    for (name, node) in &object.properties {
        if let Some(field) = fields.get(name) {
            context.push(name);
            validate_node(field, node, context);
            context.pop();
        }
    }
}
