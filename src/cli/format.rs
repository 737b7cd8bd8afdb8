//! Output formatting for CLI display.

use std::io;

use serde_json::Value;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::model::{Record, ResourceKind};

/// Columns shown for revision listings.
pub(super) const REVISION_COLUMNS: &[&str] = &["name", "id", "owner", "created"];

/// Default table columns for a kind.
pub(super) fn columns(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Project => &["owner", "name", "id", "resource_profile", "updated"],
        ResourceKind::Job => &["owner", "name", "id", "project_name", "command", "schedule", "state"],
        ResourceKind::Run => &["owner", "name", "id", "project_name", "state", "created"],
        ResourceKind::Session => &["owner", "name", "id", "project_name", "resource_profile", "state"],
        ResourceKind::Deployment => &["owner", "name", "id", "project_name", "endpoint", "state"],
        ResourceKind::Secret => &["name"],
        ResourceKind::User => &["name", "id", "email", "enabled"],
    }
}

/// Prints results to stdout in the selected format.
pub(super) struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub(super) fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub(super) fn records(&self, kind: ResourceKind, records: &[Record]) -> Result<()> {
        self.records_with(kind, columns(kind), records)
    }

    pub(super) fn records_with(
        &self,
        kind: ResourceKind,
        columns: &[&str],
        records: &[Record],
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", to_json(&records)?),
            OutputFormat::Table if records.is_empty() => println!("No {kind}s"),
            OutputFormat::Table => print!("{}", table(columns, records)),
        }
        Ok(())
    }

    pub(super) fn record(&self, record: &Record) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", to_json(record)?),
            OutputFormat::Table => print!("{}", fields(record)),
        }
        Ok(())
    }
}

fn to_json(value: &impl serde::Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value).map_err(io::Error::from)?)
}

/// Aligned columns with an upper-case header row.
pub(super) fn table(columns: &[&str], records: &[Record]) -> String {
    let header: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| columns.iter().map(|c| cell(r, c)).collect())
        .collect();

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(text, width)| format!("{text:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// One `field  value` line per field, for a single record.
pub(super) fn fields(record: &Record) -> String {
    let width = record
        .fields()
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (field, value) in record.fields() {
        let text = match value {
            Value::Array(_) | Value::Object(_) => value.to_string(),
            _ => record.text(field),
        };
        out.push_str(format!("{field:<width$}  {text}").trim_end());
        out.push('\n');
    }
    out
}

/// A table cell: scalars as text, nested values as compact JSON.
fn cell(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(value @ (Value::Array(_) | Value::Object(_))) => value.to_string(),
        _ => record.text(field),
    }
}
