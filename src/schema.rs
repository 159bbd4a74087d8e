//! Inferred schema model and its serializers.
//!
//! An [`InferredSchema`] is the ordered list of `(name, declaration)` pairs
//! produced at end of input. It renders to:
//!
//! - **DDL**: one `<name> <declaration>` entry per column, joined by `",\n"`,
//!   ready to paste into a `CREATE TABLE` body. Names are quoted with
//!   [`quote_column_name`].
//! - **JSON / YAML**: `{ columns: [{ name, type }] }` via `serde`.
//!
//! Output is always UTF-8 regardless of the input encoding.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::{cli::OutputFormat, declaration::TypeDeclaration, io_utils};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub declaration: TypeDeclaration,
}

impl ColumnDeclaration {
    pub fn to_ddl_entry(&self) -> String {
        format!("{} {}", quote_column_name(&self.name), self.declaration)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferredSchema {
    pub columns: Vec<ColumnDeclaration>,
}

impl InferredSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDeclaration> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn to_ddl_string(&self) -> String {
        self.columns
            .iter()
            .map(ColumnDeclaration::to_ddl_entry)
            .join(",\n")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing schema to JSON")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML")
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Ddl => Ok(self.to_ddl_string()),
            OutputFormat::Json => self.to_json_string(),
            OutputFormat::Yaml => self.to_yaml_string(),
        }
    }

    /// Writes the rendered schema to `path`, or stdout when `path` is `None` or `-`.
    pub fn save(&self, path: Option<&Path>, format: OutputFormat) -> Result<()> {
        let rendered = self.render(format)?;
        let mut writer = io_utils::open_output(path)?;
        writer
            .write_all(rendered.as_bytes())
            .context("Writing schema output")?;
        writer.flush().context("Flushing schema output")
    }
}

/// Quotes `name` unless it consists solely of `A-Z` and `_`.
///
/// Embedded double quotes are doubled so the result is always a valid
/// delimited identifier.
pub fn quote_column_name(name: &str) -> String {
    let bare = !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase() || c == '_');
    if bare {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
