// src/aggregate/archive.rs
use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use tracing::{debug, error, info, instrument, trace};
use zip::ZipArchive;

use crate::stats::{Extraction, Extractor, TableStats};
use crate::table::{Table, TableFormat};

/// Open the zip at `zip_path` and fold the stats of every `.xlsx` / `.csv`
/// member into one total.
///
/// Only failing to open the archive itself is returned as an error. A member
/// that cannot be read or parsed is logged and contributes nothing.
#[instrument(level = "info", skip(zip_path, extractor), fields(zip = %zip_path.as_ref().display()))]
pub fn aggregate_archive<P: AsRef<Path>>(zip_path: P, extractor: &Extractor) -> Result<TableStats> {
    let file = File::open(&zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path.as_ref()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path.as_ref()))?;

    let mut totals = TableStats::default();
    for i in 0..archive.len() {
        let (name, data) = match read_member(&mut archive, i) {
            Ok(Some(member)) => member,
            Ok(None) => continue,
            Err(e) => {
                let member = archive.name_for_index(i).unwrap_or("<unnamed entry>");
                error!(member = %member, index = i, error = ?e, "error reading inner file");
                continue;
            }
        };

        // the member handle is already released; only the buffer is left
        let table = match Table::from_member(&name, data) {
            Ok(Some(table)) => table,
            Ok(None) => continue,
            Err(e) => {
                error!(member = %name, error = ?e, "error reading inner file");
                continue;
            }
        };

        match extractor.extract(&table) {
            Extraction::Counted(stats) => {
                debug!(member = %name, rows = stats.total_rows, "inner file counted");
                totals.merge(stats);
            }
            Extraction::Skipped { missing } => {
                info!(member = %name, ?missing, "skipped inner file: missing required columns");
            }
        }
    }

    Ok(totals)
}

/// Buffer member `index` if it is a file with a supported table extension.
fn read_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<Option<(String, Vec<u8>)>> {
    let mut entry = archive
        .by_index(index)
        .with_context(|| format!("Failed to access ZIP entry #{}", index))?;
    let name = entry.name().to_string();

    if !entry.is_file() || TableFormat::from_name(&name).is_none() {
        trace!(member = %name, "ignoring unsupported member");
        return Ok(None);
    }

    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read {} into memory", name))?;
    Ok(Some((name, buf)))
}
