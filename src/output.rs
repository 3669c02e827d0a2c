// src/output.rs
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::aggregate::SummaryRow;

/// Column headers of the summary workbook, in output order.
pub const SUMMARY_HEADERS: [&str; 6] = [
    "date",
    "SENDERNAME",
    "total sent",
    "total deliveried",
    "total failed",
    "ncpr failed",
];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("{path:?} is open in another program; close the file before rerunning")]
    Locked { path: PathBuf },

    #[error("could not create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
}

/// Windows reports an open Excel file as a sharing (32) or lock (33) violation.
const ERROR_SHARING_VIOLATION: i32 = 32;
const ERROR_LOCK_VIOLATION: i32 = 33;

/// True when `err` means another process holds the file.
pub fn is_locked(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || (cfg!(windows)
            && matches!(
                err.raw_os_error(),
                Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
            ))
}

/// Write `rows` to a fresh workbook at `path`, in the given order.
#[instrument(level = "info", skip(rows), fields(path = %path.display(), rows = rows.len()))]
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut workbook = Workbook::new();
    fill_workbook(&mut workbook, rows).map_err(|source| classify(path, source))?;
    workbook.save(path).map_err(|source| classify(path, source))?;
    debug!("summary workbook saved");
    Ok(())
}

fn fill_workbook(workbook: &mut Workbook, rows: &[SummaryRow]) -> Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in SUMMARY_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.date.as_str())?;
        sheet.write_string(r, 1, row.sender_names.as_str())?;
        sheet.write_number(r, 2, row.total_sent as f64)?;
        sheet.write_number(r, 3, row.total_delivered as f64)?;
        sheet.write_number(r, 4, row.total_failed as f64)?;
        sheet.write_number(r, 5, row.ncpr_failed as f64)?;
    }
    sheet.set_column_width(1, 40)?;
    Ok(())
}

fn classify(path: &Path, source: XlsxError) -> OutputError {
    match source {
        XlsxError::IoError(ref e) if is_locked(e) => OutputError::Locked {
            path: path.to_path_buf(),
        },
        source => OutputError::Write {
            path: path.to_path_buf(),
            source,
        },
    }
}
