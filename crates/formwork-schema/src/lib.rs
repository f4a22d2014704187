//! Parameter schema model for formwork templates.
//!
//! This crate defines the JSON-Schema-shaped artifact produced by analyzing a
//! template ([`ParametersSchema`] and its [`SchemaNode`] tree), the
//! [`SchemaProvider`] trait used to resolve external schema references, and a
//! validator that checks a parameters object against a derived schema.
//!
//! The schema tree is a tagged variant (`Scalar | Array | Object`) rather than
//! a loosely-typed map, so invalid type/field combinations are unrepresentable.

pub mod error;
pub mod node;
pub mod parameters;
pub mod provider;
pub mod validate;

pub use error::{ParameterError, ParameterErrors, SchemaError};
pub use node::{Annotations, ArrayNode, ObjectNode, ScalarNode, ScalarType, SchemaNode};
pub use parameters::ParametersSchema;
pub use provider::{FieldSchema, FileSystemProvider, MemoryProvider, NullProvider, SchemaProvider};
pub use validate::validate_parameters;
