/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Command implementations
 */

//! Command implementations and the template/parameter loading shared by them.

pub mod render;
pub mod schema;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use formwork_template::{FileSystemProvider, Template};

/// How to interpret a template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Raw,
    Yaml,
}

impl InputFormat {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "raw" => Ok(InputFormat::Raw),
            "yaml" | "yml" => Ok(InputFormat::Yaml),
            other => anyhow::bail!("Unknown template format '{other}' (expected raw or yaml)"),
        }
    }

    fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Raw,
        }
    }
}

/// Load a template file, honoring a format override and an optional external
/// schema directory.
fn load_template(path: &str, format: Option<&str>, schemas: Option<&str>) -> Result<Template> {
    let path = Path::new(path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;

    let input_format = match format {
        Some(name) => InputFormat::parse(name)?,
        None => InputFormat::infer(path),
    };
    let template = match input_format {
        InputFormat::Yaml => Template::load_yaml(&text),
        InputFormat::Raw => Template::load_raw(&text),
    }
    .with_context(|| format!("Failed to load template {}", path.display()))?;

    Ok(match schemas {
        Some(dir) => template.with_provider(Arc::new(FileSystemProvider::new(dir))),
        None => template,
    })
}

/// Load a parameters file: YAML for `.yaml`/`.yml`, JSON otherwise. The top
/// level must be an object.
fn load_parameters(path: &str) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters {path}"))?;

    let value: Value = match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse parameters {path}"))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse parameters {path}"))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Parameters file {path} must contain an object"),
    }
}
