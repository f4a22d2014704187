/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Schema command implementation
 */

//! Prints the parameters schema a template requires as JSON Schema.

use anyhow::Result;
use tracing::debug;

/// Arguments for the schema command
#[derive(Debug)]
pub struct SchemaArgs {
    /// Template file path
    pub template: String,
    /// Directory of external schema files
    pub schemas: Option<String>,
    /// Format override (raw, yaml)
    pub format: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Execute the schema command
pub fn execute(args: SchemaArgs) -> Result<()> {
    debug!(template = %args.template, "deriving parameters schema");

    let template = super::load_template(
        &args.template,
        args.format.as_deref(),
        args.schemas.as_deref(),
    )?;
    let schema = template.parameters_schema()?;

    let text = if args.pretty {
        serde_json::to_string_pretty(schema)?
    } else {
        serde_json::to_string(schema)?
    };
    println!("{text}");

    Ok(())
}
