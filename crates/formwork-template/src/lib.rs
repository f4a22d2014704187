/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template engine with schema inference.
//!
//! A template is mustache-like text whose tags double as a parameter
//! declaration language: scanning a template yields both a renderable tag
//! sequence and a JSON-Schema description of every input it needs. Templates
//! load from bare text ([`Template::load_raw`]) or from a structured YAML
//! document ([`Template::load_yaml`]) carrying a default view and named
//! definitions that serve as partials and field metadata.
//!
//! ```
//! use formwork_template::Template;
//!
//! let template = Template::load_raw("Hello {{name}}!").unwrap();
//! let schema = template.parameters_schema().unwrap();
//! assert_eq!(schema.required, vec!["name"]);
//!
//! let mut parameters = serde_json::Map::new();
//! parameters.insert("name".into(), "world".into());
//! assert_eq!(template.render(&parameters).unwrap(), "Hello world!");
//! ```

mod builder;
pub mod definitions;
pub mod error;
mod render;
pub mod scanner;
pub mod tag;
mod template;

pub use definitions::Definition;
pub use error::{TemplateError, TemplateResult};
pub use template::{SourceType, Template};

// Re-exported so callers need not depend on the schema crate directly.
pub use formwork_schema::{
    FieldSchema, FileSystemProvider, MemoryProvider, NullProvider, ParameterError,
    ParameterErrors, ParametersSchema, SchemaError, SchemaNode, SchemaProvider,
};
