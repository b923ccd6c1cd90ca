//! OpenAPI Loader CLI
//!
//! Command-line interface for loading, resolving and validating OpenAPI documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use openapi_loader::{
    Document, LoadError, LoaderConfig, Session, ValidationContext, ValidationOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-loader")]
#[command(about = "Load, resolve and validate OpenAPI 3.0 documents")]
#[command(version)]
struct Cli {
    /// Log loading progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and validate it
    Validate {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// Follow references into other documents
        #[arg(long)]
        allow_external_refs: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Skip checking examples and defaults against their schemas
        #[arg(long)]
        no_examples: bool,

        /// Reject schema formats that are not known
        #[arg(long)]
        strict_formats: bool,
    },

    /// Load a document, resolving every reference, and print it as JSON
    Resolve {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// Follow references into other documents
        #[arg(long)]
        allow_external_refs: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            source,
            allow_external_refs,
            json,
            no_examples,
            strict_formats,
        } => {
            let options = ValidationOptions::new()
                .examples(!no_examples)
                .formats(strict_formats);
            run_validate(&source, allow_external_refs, options, json)
        }
        Commands::Resolve {
            source,
            allow_external_refs,
            pretty,
            output,
        } => run_resolve(&source, allow_external_refs, pretty, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(source: &str, allow_external_refs: bool) -> Result<Document, LoadError> {
    let config = LoaderConfig::new().allow_external_refs(allow_external_refs);
    Session::new(config).load_source(source)
}

fn run_validate(
    source: &str,
    allow_external_refs: bool,
    options: ValidationOptions,
    json_output: bool,
) -> Result<(), u8> {
    let document = load(source, allow_external_refs).map_err(|e| {
        let path = match &e {
            LoadError::Structural(err) => Some(err.path.clone()),
            _ => None,
        };
        report_error(json_output, &e.to_string(), path.as_deref());
        e.exit_code() as u8
    })?;

    match document.validate(&ValidationContext::with_options(options)) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(e) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "error": e.kind.to_string(),
                    "path": e.path,
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed: {}", e);
            }
            Err(e.exit_code() as u8)
        }
    }
}

fn run_resolve(
    source: &str,
    allow_external_refs: bool,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let document = load(source, allow_external_refs).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let bytes = if pretty {
        document.to_json_pretty()
    } else {
        document.to_json()
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &bytes).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}

/// Output a load error in plain text or JSON format.
fn report_error(json_output: bool, msg: &str, path: Option<&str>) {
    if json_output {
        let output = serde_json::json!({
            "valid": false,
            "error": msg,
            "path": path,
        });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}
