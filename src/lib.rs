pub mod classifier;
pub mod cli;
pub mod declaration;
pub mod error;
pub mod infer;
pub mod inspect;
pub mod io_utils;
pub mod schema;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    classifier::TemporalPatterns,
    cli::{Cli, Commands, InferArgs, InputArgs},
    infer::InferenceOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_ddl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Inspect(args) => inspect::execute(&args),
    }
}

pub(crate) fn options_from_input_args(args: &InputArgs) -> Result<InferenceOptions> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let patterns = TemporalPatterns::with_overrides(
        args.datetime_pattern.as_deref(),
        args.date_pattern.as_deref(),
        args.time_pattern.as_deref(),
    )?;
    debug!(
        "Scanning with encoding {}, fallback {:?}",
        encoding.name(),
        args.fallback
    );
    Ok(InferenceOptions {
        delimiter,
        encoding,
        patterns,
        fallback: args.fallback,
        progress_every: args.progress_every,
    })
}

fn handle_infer(args: &InferArgs) -> Result<()> {
    let options = options_from_input_args(&args.source)?;
    info!(
        "Inferring column types of '{}' with delimiter '{}'",
        args.source.input.display(),
        printable_delimiter(options.delimiter)
    );
    let (schema, stats) = infer::infer_schema(&args.source.input, &options)
        .with_context(|| format!("Inferring schema from {:?}", args.source.input))?;
    schema
        .save(args.output.as_deref(), args.format)
        .with_context(|| match &args.output {
            Some(path) => format!("Writing schema to {path:?}"),
            None => "Writing schema to stdout".to_string(),
        })?;
    info!(
        "Inferred {} column(s) from {} row(s)",
        schema.columns.len(),
        stats.rows_read
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
