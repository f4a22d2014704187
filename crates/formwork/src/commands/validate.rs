/*
 * validate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Validate command implementation
 */

//! Checks a parameters file against a template's derived schema without
//! rendering anything.

use anyhow::{Context, Result};
use tracing::debug;

/// Arguments for the validate command
#[derive(Debug)]
pub struct ValidateArgs {
    /// Template file path
    pub template: String,
    /// Parameters file path
    pub parameters: String,
    /// Directory of external schema files
    pub schemas: Option<String>,
    /// Format override (raw, yaml)
    pub format: Option<String>,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    let template = super::load_template(
        &args.template,
        args.format.as_deref(),
        args.schemas.as_deref(),
    )?;
    let parameters = super::load_parameters(&args.parameters)?;
    debug!(
        template = %args.template,
        parameters = %args.parameters,
        "validating parameters"
    );

    template
        .validate_parameters(&parameters)
        .with_context(|| format!("{} does not satisfy {}", args.parameters, args.template))?;
    println!("{} satisfies the schema of {}", args.parameters, args.template);

    Ok(())
}
