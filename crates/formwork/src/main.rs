//! Formwork CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::render::RenderArgs;
use commands::schema::SchemaArgs;
use commands::validate::ValidateArgs;

#[derive(Parser)]
#[command(name = "formwork")]
#[command(version)]
#[command(about = "Template schema compiler and renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parameters schema a template requires
    Schema {
        /// Template file (.yaml/.yml load as documents, anything else as raw text)
        template: String,

        /// Directory of external schema files (NAME.json)
        #[arg(long)]
        schemas: Option<String>,

        /// Force the template format (raw, yaml)
        #[arg(long)]
        format: Option<String>,

        /// Pretty-print the schema JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Render a template with a parameters file
    Render {
        /// Template file
        template: String,

        /// Parameters file (.json, or .yaml/.yml)
        parameters: Option<String>,

        /// Directory of external schema files (NAME.json)
        #[arg(long)]
        schemas: Option<String>,

        /// Force the template format (raw, yaml)
        #[arg(long)]
        format: Option<String>,

        /// Skip parameter validation before rendering
        #[arg(long)]
        no_validate: bool,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Check a parameters file against a template's schema
    Validate {
        /// Template file
        template: String,

        /// Parameters file (.json, or .yaml/.yml)
        parameters: String,

        /// Directory of external schema files (NAME.json)
        #[arg(long)]
        schemas: Option<String>,

        /// Force the template format (raw, yaml)
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formwork=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema {
            template,
            schemas,
            format,
            pretty,
        } => commands::schema::execute(SchemaArgs {
            template,
            schemas,
            format,
            pretty,
        }),
        Commands::Render {
            template,
            parameters,
            schemas,
            format,
            no_validate,
            output,
        } => commands::render::execute(RenderArgs {
            template,
            parameters,
            schemas,
            format,
            no_validate,
            output,
        }),
        Commands::Validate {
            template,
            parameters,
            schemas,
            format,
        } => commands::validate::execute(ValidateArgs {
            template,
            parameters,
            schemas,
            format,
        }),
    }
}
