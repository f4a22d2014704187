/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Renders a template with a parameters file. Parameters are validated
//! against the derived schema first unless `--no-validate` is given.

use anyhow::{Context, Result};
use serde_json::Map;
use tracing::{debug, info};

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Template file path
    pub template: String,
    /// Parameters file path; missing means defaults and view only
    pub parameters: Option<String>,
    /// Directory of external schema files
    pub schemas: Option<String>,
    /// Format override (raw, yaml)
    pub format: Option<String>,
    /// Skip validation before rendering
    pub no_validate: bool,
    /// Output file path; missing means stdout
    pub output: Option<String>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let template = super::load_template(
        &args.template,
        args.format.as_deref(),
        args.schemas.as_deref(),
    )?;

    let parameters = match &args.parameters {
        Some(path) => super::load_parameters(path)?,
        None => Map::new(),
    };
    debug!(
        template = %args.template,
        parameters = parameters.len(),
        "rendering template"
    );

    let rendered = if args.no_validate {
        template.render(&parameters)?
    } else {
        template.render_validated(&parameters)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output file {path}"))?;
            info!("Output: {path}");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
