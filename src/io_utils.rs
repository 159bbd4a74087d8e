//! I/O utilities for reading delimited input and writing schema output.
//!
//! All file I/O in csv-ddl flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Encoding**: per-field decoding via `encoding_rs`, defaulting to UTF-8.
//!   Encodings that are not ASCII-compatible (UTF-16LE/BE) are transcoded to
//!   UTF-8 with `encoding_rs_io` before the delimiter is applied.
//! - **Row source**: a flexible, quote-unaware `csv` reader. Rows may carry
//!   fewer or more fields than the header, and only real line terminators
//!   are stripped from each line.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Builds a row reader that splits on `delimiter` only.
///
/// Quote characters are ordinary field content and rows of any width are
/// accepted; the header is read separately through [`reader_headers`].
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .quoting(false)
        .flexible(true);
    builder.from_reader(reader)
}

/// Prepares `reader` for single-byte delimiter splitting.
///
/// Returns the stream to split together with the encoding its fields must be
/// decoded with. ASCII-compatible encodings pass through unchanged; any other
/// encoding is transcoded to UTF-8 here, honouring and stripping a BOM.
/// Malformed sequences in a transcoded stream become U+FFFD.
pub fn transcode_input<'r, R>(
    reader: R,
    encoding: &'static Encoding,
) -> (Box<dyn Read + 'r>, &'static Encoding)
where
    R: Read + 'r,
{
    if encoding.is_ascii_compatible() {
        return (Box::new(reader), encoding);
    }
    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .bom_override(true)
        .strip_bom(true)
        .build(reader);
    (Box::new(decoder), UTF_8)
}

/// Opens `path` for reading, or stdin when `path` is `-`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    Ok(if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    })
}

/// Opens `path` for writing, or stdout when `path` is `None` or `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding).context("Decoding header row")
}
