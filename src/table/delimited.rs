// src/table/delimited.rs
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use tracing::{trace, warn};

use super::{Cell, Table};

/// Read a comma-separated table whose first record is the header.
///
/// Unlike the xlsx path this is lenient per record: records that fail to parse,
/// or carry more fields than the header, are dropped and the rest are kept.
/// Records with fewer fields are padded with empty cells. Numeric-looking
/// fields are read as numbers.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // field-count mismatches are handled below
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                trace!(record = idx, error = %e, "dropping unparsable CSV record");
                dropped += 1;
                continue;
            }
        };
        if record.len() > headers.len() {
            trace!(
                record = idx,
                fields = record.len(),
                expected = headers.len(),
                "dropping CSV record with too many fields"
            );
            dropped += 1;
            continue;
        }
        rows.push(record.iter().map(Cell::from_text_inferred).collect());
    }
    if dropped > 0 {
        warn!(dropped, kept = rows.len(), "skipped malformed CSV records");
    }

    Ok(Table::new(headers, rows))
}
