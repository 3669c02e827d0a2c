// src/table/sheet.rs
use anyhow::{anyhow, Context, Result};
use calamine::{Data, Reader, Xlsx};
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use tracing::{instrument, trace};

use super::{Cell, Table};

/// Load the first worksheet of the `.xlsx` file at `path`.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_xlsx_path<P: AsRef<Path>>(path: P) -> Result<Table> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open workbook: {:?}", path.as_ref()))?;
    read_xlsx(BufReader::new(file))
        .with_context(|| format!("Failed to read workbook: {:?}", path.as_ref()))
}

/// Read the first worksheet: row 0 is the header, every non-blank row after it a record.
/// Any structural problem with the workbook fails the whole load.
pub fn read_xlsx<RS: Read + Seek>(reader: RS) -> Result<Table> {
    let mut workbook: Xlsx<RS> = Xlsx::new(reader).context("not a valid xlsx workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook contains no worksheets"))?
        .context("failed to read first worksheet")?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, d)| match to_cell(d) {
                Cell::Empty => format!("Unnamed: {}", i),
                cell => cell.to_string(),
            })
            .collect(),
        // an empty sheet has no columns at all
        None => return Ok(Table::default()),
    };

    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|r| r.iter().map(to_cell).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| *c != Cell::Empty))
        .collect();
    trace!(columns = headers.len(), rows = rows.len(), "worksheet loaded");

    Ok(Table::new(headers, rows))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::String(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::String(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{xlsx_bytes, Row};
    use std::io::Cursor;

    #[test]
    fn reads_header_and_records() -> Result<()> {
        let bytes = xlsx_bytes(
            &[" Status", "Cause ", "SenderId"],
            &[
                Row::text(&["DELIVERED", "", "ACME"]),
                Row::text(&["FAILED", "NCPR FAIL", "ACME"]),
            ],
        )?;
        let table = read_xlsx(Cursor::new(bytes))?;
        assert_eq!(table.headers(), ["Status", "Cause", "SenderId"]);
        assert_eq!(table.len(), 2);
        let causes: Vec<String> = table.column("Cause").unwrap().map(|c| c.to_string()).collect();
        assert_eq!(causes, vec!["nan", "NCPR FAIL"]);
        Ok(())
    }

    #[test]
    fn numeric_sender_ids_display_as_integers() -> Result<()> {
        let bytes = xlsx_bytes(
            &["Status", "Cause", "SenderId"],
            &[Row::with_number(&["DELIVERED", "OK"], 90210.0)],
        )?;
        let table = read_xlsx(Cursor::new(bytes))?;
        let ids: Vec<String> = table.column("SenderId").unwrap().map(|c| c.to_string()).collect();
        assert_eq!(ids, vec!["90210"]);
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        let err = read_xlsx(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(err.is_err());
    }

    #[test]
    fn reads_from_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("2024-03-01.xlsx");
        std::fs::write(
            &path,
            xlsx_bytes(&["Status"], &[Row::text(&["DELIVERED"])])?,
        )?;
        let table = read_xlsx_path(&path)?;
        assert_eq!(table.len(), 1);
        assert!(read_xlsx_path(dir.path().join("missing.xlsx")).is_err());
        Ok(())
    }
}
