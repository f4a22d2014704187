/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The compiled template.
//!
//! A [`Template`] owns its source text, the scanned tag sequences for the
//! template body and every definition sub-template, and a lazily built
//! [`ParametersSchema`]. Loading never performs schema work; the schema is
//! built on first use and memoized, so repeated renders pay for analysis once.

use std::collections::HashMap;
use std::sync::Arc;

use hashlink::LinkedHashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use formwork_schema::{ParametersSchema, SchemaProvider, validate_parameters};

use crate::builder::build_schema;
use crate::definitions::{Definition, parse_document};
use crate::error::TemplateResult;
use crate::render::{Renderer, apply_standalone};
use crate::scanner::{first_comment, scan};
use crate::tag::Tag;

/// How a template was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    /// Bare template text.
    #[serde(rename = "raw-template")]
    Raw,
    /// YAML document with view, definitions, and a template body.
    #[serde(rename = "structured-document")]
    Structured,
}

/// A loaded template, ready to describe and render its parameters.
#[derive(Clone)]
pub struct Template {
    source_type: SourceType,
    source_text: String,
    /// Lowercase hex SHA-256 of the source text.
    source_hash: String,
    template_text: String,
    title: String,
    description: String,
    default_view: Map<String, Value>,
    definitions: LinkedHashMap<String, Definition>,
    /// Scanned template body, literals intact.
    tags: Vec<Tag>,
    /// Body after the standalone-line whitespace pass, used for rendering.
    render_tags: Vec<Tag>,
    /// Scanned definition sub-templates, by name.
    partials: HashMap<String, Vec<Tag>>,
    /// Partials after the standalone-line pass.
    render_partials: HashMap<String, Vec<Tag>>,
    provider: Option<Arc<dyn SchemaProvider>>,
    schema: OnceCell<ParametersSchema>,
}

/// Serialized form of a template. Tag sequences and the schema are derived
/// state and are recomputed on load; the provider never round-trips.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateData {
    source_type: SourceType,
    source_text: String,
    source_hash: String,
    template_text: String,
    title: String,
    description: String,
    default_view: Map<String, Value>,
    definitions: LinkedHashMap<String, Definition>,
}

impl Template {
    /// Load bare template text.
    pub fn load_raw(text: &str) -> TemplateResult<Self> {
        Self::compile(
            SourceType::Raw,
            text.to_string(),
            text.to_string(),
            String::new(),
            None,
            Map::new(),
            LinkedHashMap::new(),
        )
    }

    /// Load a structured YAML document.
    pub fn load_yaml(text: &str) -> TemplateResult<Self> {
        let document = parse_document(text)?;
        Self::compile(
            SourceType::Structured,
            text.to_string(),
            document.template,
            document.title,
            document.description,
            document.view,
            document.definitions,
        )
    }

    fn compile(
        source_type: SourceType,
        source_text: String,
        template_text: String,
        title: String,
        description: Option<String>,
        default_view: Map<String, Value>,
        definitions: LinkedHashMap<String, Definition>,
    ) -> TemplateResult<Self> {
        let tags = scan(&template_text)?;

        let mut partials = HashMap::new();
        let mut render_partials = HashMap::new();
        for (name, definition) in &definitions {
            if let Some(body) = &definition.template {
                let scanned = scan(body)?;
                render_partials.insert(name.clone(), apply_standalone(&scanned));
                partials.insert(name.clone(), scanned);
            }
        }

        // An explicit document description wins over the first template
        // comment.
        let description = description
            .or_else(|| first_comment(&tags).map(str::to_string))
            .unwrap_or_default();

        let source_hash = format!("{:x}", Sha256::digest(source_text.as_bytes()));
        debug!(%source_hash, partials = partials.len(), "template compiled");

        Ok(Self {
            source_type,
            source_text,
            source_hash,
            render_tags: apply_standalone(&tags),
            tags,
            template_text,
            title,
            description,
            default_view,
            definitions,
            partials,
            render_partials,
            provider: None,
            schema: OnceCell::new(),
        })
    }

    /// Attach a provider for external schema references. Clears any built
    /// schema, since resolution may now succeed differently.
    pub fn with_provider(mut self, provider: Arc<dyn SchemaProvider>) -> Self {
        self.provider = Some(provider);
        self.schema = OnceCell::new();
        self
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_view(&self) -> &Map<String, Value> {
        &self.default_view
    }

    pub fn definitions(&self) -> &LinkedHashMap<String, Definition> {
        &self.definitions
    }

    /// The parameters schema, built on first call and memoized. Errors are
    /// not cached; a failed build is retried on the next call.
    pub fn parameters_schema(&self) -> TemplateResult<&ParametersSchema> {
        self.schema.get_or_try_init(|| {
            build_schema(
                &self.tags,
                &self.definitions,
                &self.partials,
                self.provider.as_deref(),
                &self.title,
                &self.description,
            )
        })
    }

    /// The default value of every parameter that declares one, with the
    /// document view overlaid.
    pub fn default_parameters(&self) -> TemplateResult<Map<String, Value>> {
        let mut defaults = self.parameters_schema()?.default_parameters();
        for (name, value) in &self.default_view {
            defaults.insert(name.clone(), value.clone());
        }
        Ok(defaults)
    }

    /// Render with the supplied parameters. Missing parameters fall back to
    /// the document view, then to definition defaults and annotation type
    /// defaults, then to the empty string. Rendering never needs the schema,
    /// so a failed schema build does not block it.
    pub fn render(&self, parameters: &Map<String, Value>) -> TemplateResult<String> {
        let renderer = Renderer::new(
            &self.tags,
            &self.render_partials,
            &self.definitions,
            &self.default_view,
            parameters,
        );
        renderer.render(&self.render_tags)
    }

    /// Render with no supplied parameters: view and defaults only.
    pub fn render_default(&self) -> TemplateResult<String> {
        self.render(&Map::new())
    }

    /// Check a parameters object against the schema without rendering.
    pub fn validate_parameters(&self, parameters: &Map<String, Value>) -> TemplateResult<()> {
        let schema = self.parameters_schema()?;
        validate_parameters(schema, parameters)?;
        Ok(())
    }

    /// Validate, then render.
    pub fn render_validated(&self, parameters: &Map<String, Value>) -> TemplateResult<String> {
        self.validate_parameters(parameters)?;
        self.render(parameters)
    }

    /// Serialize to the persistent JSON form.
    pub fn to_json(&self) -> TemplateResult<String> {
        let data = TemplateData {
            source_type: self.source_type,
            source_text: self.source_text.clone(),
            source_hash: self.source_hash.clone(),
            template_text: self.template_text.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            default_view: self.default_view.clone(),
            definitions: self.definitions.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    /// Load from the persistent JSON form. Derived state is recomputed.
    pub fn from_json_str(text: &str) -> TemplateResult<Self> {
        let data: TemplateData = serde_json::from_str(text)?;
        Self::compile(
            data.source_type,
            data.source_text,
            data.template_text,
            data.title,
            Some(data.description),
            data.default_view,
            data.definitions,
        )
    }

    /// Load from the persistent JSON form and attach a provider.
    pub fn from_json_with_provider(
        text: &str,
        provider: Arc<dyn SchemaProvider>,
    ) -> TemplateResult<Self> {
        Ok(Self::from_json_str(text)?.with_provider(provider))
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("source_type", &self.source_type)
            .field("source_hash", &self.source_hash)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("definitions", &self.definitions.len())
            .field("provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Template {
    /// Providers and cached schemas are excluded; two templates are equal
    /// when their persistent state is.
    fn eq(&self, other: &Self) -> bool {
        self.source_type == other.source_type
            && self.source_text == other.source_text
            && self.source_hash == other.source_hash
            && self.template_text == other.template_text
            && self.title == other.title
            && self.description == other.description
            && self.default_view == other.default_view
            && self.definitions == other.definitions
    }
}
