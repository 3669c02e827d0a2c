//! Fixture builders shared by the unit tests: in-memory xlsx workbooks,
//! zip archives and delivery reports with known counts.

use anyhow::Result;
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Write};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

pub const REPORT_HEADERS: [&str; 3] = ["Status", "Cause", "SenderId"];

pub enum Value {
    Text(String),
    Number(f64),
}

/// One worksheet row; empty text cells are left blank.
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn text(cells: &[&str]) -> Self {
        Row(cells.iter().map(|c| Value::Text(c.to_string())).collect())
    }

    pub fn with_number(cells: &[&str], last: f64) -> Self {
        let mut row = Row::text(cells);
        row.0.push(Value::Number(last));
        row
    }
}

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ncpr_summary=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn xlsx_bytes(headers: &[&str], rows: &[Row]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, h) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *h)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.0.iter().enumerate() {
            let (r, c) = ((r + 1) as u32, c as u16);
            match value {
                Value::Text(s) if s.is_empty() => {}
                Value::Text(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Value::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// Report rows with `total` rows, the first `delivered` of which are delivered,
/// and the last `ncpr` of which carry the NCPR FAIL cause. Senders cycle.
pub fn report_rows(total: usize, delivered: usize, ncpr: usize, senders: &[&str]) -> Vec<Row> {
    (0..total)
        .map(|i| {
            let status = if i < delivered { "DELIVERED" } else { "FAILED" };
            let cause = if i >= total - ncpr { "NCPR FAIL" } else { "" };
            let sender = senders[i % senders.len()];
            Row::text(&[status, cause, sender])
        })
        .collect()
}

pub fn report_xlsx(total: usize, delivered: usize, ncpr: usize, senders: &[&str]) -> Result<Vec<u8>> {
    xlsx_bytes(&REPORT_HEADERS, &report_rows(total, delivered, ncpr, senders))
}

pub fn report_csv(total: usize, delivered: usize, ncpr: usize, senders: &[&str]) -> Vec<u8> {
    let mut out = REPORT_HEADERS.join(",");
    out.push('\n');
    for row in report_rows(total, delivered, ncpr, senders) {
        let fields: Vec<&str> = row
            .0
            .iter()
            .map(|v| match v {
                Value::Text(s) => s.as_str(),
                Value::Number(_) => "",
            })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

/// Build a zip; member names ending in `/` become directory entries.
pub fn zip_bytes(members: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in members {
            if name.ends_with('/') {
                zip.add_directory(*name, options)?;
            } else {
                zip.start_file(*name, options)?;
                zip.write_all(data)?;
            }
        }
        zip.finish()?;
    }
    Ok(buf)
}
