//! Output formatting for fetched records.
//!
//! Supports pretty-printing, JSON serialization, and CSV files.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::records::Table;

/// Logs records using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(records: &[T]) {
    debug!("{:#?}", records);
}

/// Logs records as pretty-printed JSON.
pub fn print_json<T: Serialize>(records: &[T]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

/// Writes typed records to a CSV file at `path`, replacing any existing file.
///
/// The header comes from the record's field names; `None` fields are empty cells.
/// An empty slice produces an empty file.
pub fn write_csv<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    debug!(path, rows = records.len(), "Writing CSV");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes an untyped [`Table`]: its column set as header, then one line per row.
pub fn write_table_csv<W: Write>(out: W, table: &Table) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(
            table
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.flush()?;

    Ok(())
}
