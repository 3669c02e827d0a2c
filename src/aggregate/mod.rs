// src/aggregate/mod.rs
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::output::{write_summary, OutputError};
use crate::stats::{Extraction, TableStats};
use crate::table::{has_extension, sheet::read_xlsx_path};

pub mod archive;

/// One output line: everything seen for a single input file or archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// File name without its extension, used verbatim.
    pub date: String,
    pub sender_names: String,
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub ncpr_failed: u64,
}

impl SummaryRow {
    pub fn from_stats(date: impl Into<String>, stats: TableStats) -> Self {
        SummaryRow {
            date: date.into(),
            sender_names: stats.sender_ids.into_iter().collect::<Vec<_>>().join(", "),
            total_sent: stats.total_rows,
            total_delivered: stats.delivered,
            total_failed: stats.failed,
            ncpr_failed: stats.ncpr_failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single `.xlsx` report.
    Sheet,
    /// A `.zip` of `.xlsx` / `.csv` reports, summarised as one row.
    Archive,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        if has_extension(name, "xlsx") {
            Some(SourceKind::Sheet)
        } else if has_extension(name, "zip") {
            Some(SourceKind::Archive)
        } else {
            None
        }
    }
}

/// How a run ended. None of these abort the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoData,
    Written { path: PathBuf, rows: usize },
    OutputLocked { path: PathBuf },
    WriteFailed { path: PathBuf, reason: String },
}

/// Walks the input directory and owns the summary rows collected along the way.
pub struct Aggregator<'a> {
    config: &'a Config,
    rows: Vec<SummaryRow>,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Aggregator {
            config,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Process every direct entry of the configured input directory.
    pub fn scan(&mut self) {
        let dir = &self.config.input_dir;
        info!(dir = %dir.display(), "processing data files");

        let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(rd) => rd.filter_map(|e| e.ok().map(|e| e.path())).collect(),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "cannot list input directory");
                return;
            }
        };
        entries.sort();

        for path in entries {
            self.process_entry(&path);
        }
    }

    /// Classify one top-level entry and fold it into at most one summary row.
    pub fn process_entry(&mut self, path: &Path) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };
        let kind = match SourceKind::from_name(&name) {
            Some(kind) if path.is_file() => kind,
            _ => {
                debug!(file = %name, "ignoring entry");
                return;
            }
        };
        let date = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match kind {
            SourceKind::Sheet => self.process_sheet(path, &name, date),
            SourceKind::Archive => self.process_archive(path, &name, date),
        }
    }

    #[instrument(level = "info", skip(self, path, date))]
    fn process_sheet(&mut self, path: &Path, name: &str, date: String) {
        if name == self.config.output_file_name {
            info!("skipping old summary file");
            return;
        }

        info!("reading workbook");
        let table = match read_xlsx_path(path) {
            Ok(table) => table,
            Err(e) => {
                error!(error = ?e, "error reading workbook");
                return;
            }
        };

        match self.config.extractor.extract(&table) {
            Extraction::Counted(stats) if stats.total_rows > 0 => {
                self.rows.push(SummaryRow::from_stats(date, stats));
                info!("successfully processed");
            }
            Extraction::Counted(_) => debug!("workbook has no rows"),
            Extraction::Skipped { missing } => {
                info!(?missing, "skipped: missing required columns");
            }
        }
    }

    #[instrument(level = "info", skip(self, path, date))]
    fn process_archive(&mut self, path: &Path, name: &str, date: String) {
        info!("extracting archive");
        match archive::aggregate_archive(path, &self.config.extractor) {
            Ok(stats) if stats.total_rows > 0 => {
                self.rows.push(SummaryRow::from_stats(date, stats));
                info!("successfully processed and aggregated");
            }
            Ok(_) => warn!("no valid data found in archive"),
            Err(e) => error!(error = ?e, "error reading archive"),
        }
    }

    /// Consume the aggregator, returning rows ordered by date.
    pub fn into_sorted_rows(self) -> Vec<SummaryRow> {
        let mut rows = self.rows;
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        rows
    }
}

/// Scan the input, then write the sorted summary. Every failure is reported
/// here and folded into the returned [`Outcome`].
pub fn run(config: &Config) -> Outcome {
    let mut aggregator = Aggregator::new(config);
    aggregator.scan();
    let rows = aggregator.into_sorted_rows();

    if rows.is_empty() {
        warn!("no data was successfully processed");
        return Outcome::NoData;
    }

    let path = config.output_path();
    match write_summary(&rows, &path) {
        Ok(()) => {
            info!(path = %path.display(), rows = rows.len(), "summary saved");
            Outcome::Written {
                path,
                rows: rows.len(),
            }
        }
        Err(OutputError::Locked { path }) => {
            error!(
                path = %path.display(),
                "failed to save: permission denied. Please close the file before rerunning"
            );
            Outcome::OutputLocked { path }
        }
        Err(e) => {
            error!(error = %e, "an error occurred while saving");
            Outcome::WriteFailed {
                path,
                reason: e.to_string(),
            }
        }
    }
}
