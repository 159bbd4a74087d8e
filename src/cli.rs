use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{classifier::FallbackMode, infer::DEFAULT_PROGRESS_INTERVAL};

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer SQL column types from delimited text files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer the narrowest SQL type of every column and write the declarations
    Infer(InferArgs),
    /// Print the inferred type of every column together with the statistics behind it
    Inspect(InspectArgs),
}

/// Options shared by every command that scans an input file.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file to scan ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Field delimiter (supports ',', 'tab', ';', '|')
    #[arg(short = 's', long, alias = "separator", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(short = 'e', long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Regular expression searched for in date-and-time values
    #[arg(long = "datetime-pattern")]
    pub datetime_pattern: Option<String>,
    /// Regular expression searched for in date values
    #[arg(long = "date-pattern")]
    pub date_pattern: Option<String>,
    /// Regular expression searched for in time values
    #[arg(long = "time-pattern")]
    pub time_pattern: Option<String>,
    /// What happens to a value that forces a column onto a wider type
    #[arg(long, value_enum, default_value = "discard")]
    pub fallback: FallbackMode,
    /// Log progress every N data rows (0 disables progress output)
    #[arg(long = "progress-every", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_every: usize,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Destination file for the declarations (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "ddl")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `name TYPE` entries separated by a comma and newline
    #[default]
    Ddl,
    Json,
    Yaml,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_aliases() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
    }

    #[test]
    fn parse_delimiter_rejects_invalid_values() {
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert_eq!(
            parse_delimiter("§"),
            Err("Delimiter must be ASCII".to_string())
        );
    }

    #[test]
    fn infer_arguments_parse_with_defaults() {
        let cli = Cli::try_parse_from(["csv-ddl", "infer", "-i", "data.csv"]).expect("parse");
        let Commands::Infer(args) = cli.command else {
            panic!("expected infer command");
        };
        assert_eq!(args.format, OutputFormat::Ddl);
        assert_eq!(args.source.fallback, FallbackMode::Discard);
        assert_eq!(args.source.progress_every, DEFAULT_PROGRESS_INTERVAL);
        assert!(args.output.is_none());
    }

    #[test]
    fn separator_alias_and_short_flags_are_accepted() {
        let cli = Cli::try_parse_from([
            "csv-ddl",
            "inspect",
            "-i",
            "data.txt",
            "--separator",
            "pipe",
            "-e",
            "latin1",
            "--fallback",
            "replay",
        ])
        .expect("parse");
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.source.delimiter, Some(b'|'));
        assert_eq!(args.source.input_encoding.as_deref(), Some("latin1"));
        assert_eq!(args.source.fallback, FallbackMode::Replay);
    }
}
