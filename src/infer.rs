//! Streaming schema inference over a delimited file.
//!
//! [`SchemaInference`] owns one [`ColumnClassifier`] per header column and is
//! fed rows in order. Field `i` goes to column `i`; a short row leaves the
//! trailing columns untouched and extra fields are ignored. Neither case
//! fails the run: both are counted in [`InferenceStats`] and reported as
//! warnings once the input is exhausted.
//!
//! Nothing is buffered beyond the classifiers themselves, so memory grows
//! with the number of columns plus, for text columns, the number of distinct
//! field lengths seen.

use std::{io::Read, path::Path, sync::Arc};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};

use crate::{
    classifier::{ColumnClassifier, FallbackMode, TemporalPatterns},
    error::InferError,
    io_utils,
    schema::{ColumnDeclaration, InferredSchema},
};

pub const DEFAULT_PROGRESS_INTERVAL: usize = 5000;

#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub patterns: TemporalPatterns,
    pub fallback: FallbackMode,
    /// Log progress every this many data rows; `0` disables progress logging.
    pub progress_every: usize,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            patterns: TemporalPatterns::default(),
            fallback: FallbackMode::default(),
            progress_every: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceStats {
    pub rows_read: usize,
    pub short_rows: usize,
    pub long_rows: usize,
    pub decode_errors: usize,
}

#[derive(Debug, Clone)]
pub struct SchemaInference {
    classifiers: Vec<ColumnClassifier>,
    stats: InferenceStats,
}

impl SchemaInference {
    pub fn new(headers: &[String], patterns: TemporalPatterns, fallback: FallbackMode) -> Self {
        let patterns = Arc::new(patterns);
        let classifiers = headers
            .iter()
            .map(|name| ColumnClassifier::new(name.clone(), Arc::clone(&patterns), fallback))
            .collect();
        Self {
            classifiers,
            stats: InferenceStats::default(),
        }
    }

    pub fn classifiers(&self) -> &[ColumnClassifier] {
        &self.classifiers
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }

    /// Feeds one data row. `None` fields could not be decoded and leave
    /// their column unchanged.
    pub fn ingest<S>(&mut self, row: &[Option<S>])
    where
        S: AsRef<str>,
    {
        self.stats.rows_read += 1;
        let width = self.classifiers.len();
        if row.len() < width {
            self.stats.short_rows += 1;
            debug!(
                "Row {} has {} field(s) for {} column(s)",
                self.stats.rows_read,
                row.len(),
                width
            );
        } else if row.len() > width {
            self.stats.long_rows += 1;
            debug!(
                "Row {} has {} field(s) for {} column(s); ignoring extras",
                self.stats.rows_read,
                row.len(),
                width
            );
        }
        for (classifier, field) in self.classifiers.iter_mut().zip(row) {
            match field {
                Some(value) => classifier.accept(value.as_ref()),
                None => self.stats.decode_errors += 1,
            }
        }
    }

    /// Renders every column in header order.
    pub fn finish(self) -> Result<InferredSchema, InferError> {
        let columns = self
            .classifiers
            .iter()
            .map(|classifier| {
                Ok(ColumnDeclaration {
                    name: classifier.name().to_string(),
                    declaration: classifier.render()?,
                })
            })
            .collect::<Result<Vec<_>, InferError>>()?;
        Ok(InferredSchema { columns })
    }
}

/// Reads `input` to the end and returns the classifiers before rendering.
pub fn scan_reader<R>(input: R, options: &InferenceOptions) -> Result<SchemaInference>
where
    R: Read,
{
    let (input, encoding) = io_utils::transcode_input(input, options.encoding);
    let mut reader = io_utils::open_csv_reader(input, options.delimiter);
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    debug!("Header columns: {:?}", headers);
    let mut inference =
        SchemaInference::new(&headers, options.patterns.clone(), options.fallback);

    let mut record = csv::ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading row {}", inference.stats.rows_read + 2))?
    {
        let row = record
            .iter()
            .map(|field| io_utils::decode_bytes(field, encoding).ok())
            .collect::<Vec<_>>();
        inference.ingest(&row);
        let rows_read = inference.stats.rows_read;
        if options.progress_every > 0 && rows_read % options.progress_every == 0 {
            info!("Processed {rows_read} row(s)");
        }
    }

    report_malformed_rows(&inference.stats);
    Ok(inference)
}

pub fn scan(path: &Path, options: &InferenceOptions) -> Result<SchemaInference> {
    let input = io_utils::open_input(path)?;
    scan_reader(input, options)
}

pub fn infer_schema(
    path: &Path,
    options: &InferenceOptions,
) -> Result<(InferredSchema, InferenceStats)> {
    let inference = scan(path, options).with_context(|| format!("Scanning {path:?}"))?;
    let stats = inference.stats().clone();
    let schema = inference.finish()?;
    Ok((schema, stats))
}

fn report_malformed_rows(stats: &InferenceStats) {
    if stats.short_rows > 0 {
        warn!(
            "{} row(s) had fewer fields than the header; missing columns were left unchanged",
            stats.short_rows
        );
    }
    if stats.long_rows > 0 {
        warn!(
            "{} row(s) had more fields than the header; extra fields were ignored",
            stats.long_rows
        );
    }
    if stats.decode_errors > 0 {
        warn!(
            "{} field(s) could not be decoded and were skipped",
            stats.decode_errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::Variant,
        declaration::{IntegerWidth, TypeDeclaration},
    };
    use encoding_rs::{UTF_16LE, WINDOWS_1252};

    fn scan_str(input: &str, fallback: FallbackMode) -> SchemaInference {
        let options = InferenceOptions {
            fallback,
            ..InferenceOptions::default()
        };
        scan_reader(input.as_bytes(), &options).expect("scan input")
    }

    fn declarations(schema: &InferredSchema) -> Vec<String> {
        schema
            .columns
            .iter()
            .map(|column| column.declaration.to_string())
            .collect()
    }

    #[test]
    fn classifiers_start_as_integers_named_after_header() {
        let inference = scan_str("id,name\n", FallbackMode::Discard);
        let names = inference
            .classifiers()
            .iter()
            .map(|c| (c.name(), c.variant()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![("id", Variant::Integer), ("name", Variant::Integer)]
        );
        assert_eq!(inference.stats().rows_read, 0);
    }

    #[test]
    fn replay_settles_mixed_column_on_text() {
        let inference = scan_str("a,b\n1,2020-01-01\n2,hello\n", FallbackMode::Replay);
        let schema = inference.finish().expect("render");
        assert_eq!(
            schema.column("a").map(|c| c.declaration),
            Some(TypeDeclaration::Integer(IntegerWidth::Bits8))
        );
        assert_eq!(
            schema.column("b").map(|c| c.declaration),
            Some(TypeDeclaration::Char {
                width: 5,
                national: false
            })
        );
    }

    #[test]
    fn discard_advances_one_step_per_rejection() {
        let inference = scan_str("a,b\n1,2020-01-01\n2,hello\n", FallbackMode::Discard);
        assert_eq!(inference.classifiers()[1].variant(), Variant::DateTime);
        let schema = inference.finish().expect("render");
        assert_eq!(declarations(&schema), vec!["BYTEINT", "TIMESTAMP"]);
    }

    #[test]
    fn short_and_long_rows_are_tolerated() {
        let inference = scan_str("a,b,c\n1,2,3\n4\n5,6,7,x\n", FallbackMode::Discard);
        let stats = inference.stats().clone();
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.short_rows, 1);
        assert_eq!(stats.long_rows, 1);
        let schema = inference.finish().expect("render");
        assert_eq!(declarations(&schema), vec!["BYTEINT", "BYTEINT", "BYTEINT"]);
    }

    #[test]
    fn undecodable_fields_leave_column_unchanged() {
        let options = InferenceOptions::default();
        let input: &[u8] = b"id,name\n1,caf\xe9\n2,ok\n";
        let inference = scan_reader(input, &options).expect("scan");
        assert_eq!(inference.stats().decode_errors, 1);
        assert_eq!(inference.classifiers()[1].variant(), Variant::Float);

        let options = InferenceOptions {
            encoding: WINDOWS_1252,
            ..InferenceOptions::default()
        };
        let inference = scan_reader(input, &options).expect("scan");
        assert_eq!(inference.stats().decode_errors, 0);
    }

    #[test]
    fn overflow_aborts_rendering() {
        let inference = scan_str(
            "small,big\n1,1\n2,99999999999999999999\n",
            FallbackMode::Discard,
        );
        let err = inference.finish().expect_err("overflow");
        assert!(err.to_string().contains("Column 'big'"));
    }

    #[test]
    fn empty_input_yields_empty_schema() {
        let schema = scan_str("", FallbackMode::Discard)
            .finish()
            .expect("render");
        assert!(schema.columns.is_empty());
    }

    #[test]
    fn custom_delimiter_splits_fields() {
        let options = InferenceOptions {
            delimiter: b'|',
            ..InferenceOptions::default()
        };
        let inference = scan_reader("x|y\n1.25|7\n".as_bytes(), &options).expect("scan");
        let schema = inference.finish().expect("render");
        assert_eq!(declarations(&schema), vec!["REAL", "BYTEINT"]);
    }

    #[test]
    fn utf16le_input_is_classified() {
        let options = InferenceOptions {
            encoding: UTF_16LE,
            fallback: FallbackMode::Replay,
            ..InferenceOptions::default()
        };
        let input = "A,B\n1,x\n2,y\n"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect::<Vec<_>>();
        let inference = scan_reader(input.as_slice(), &options).expect("scan utf-16");
        assert_eq!(inference.stats().decode_errors, 0);
        let schema = inference.finish().expect("render");
        assert_eq!(
            schema.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert_eq!(declarations(&schema), vec!["BYTEINT", "CHAR(1)"]);
    }

    #[test]
    fn blank_lines_are_not_rows() {
        let inference = scan_str("N,M\nab,1\n\ncd,2\n", FallbackMode::Replay);
        assert_eq!(inference.stats().rows_read, 2);
        let schema = inference.finish().expect("render");
        assert_eq!(declarations(&schema), vec!["CHAR(2)", "BYTEINT"]);
    }
}
