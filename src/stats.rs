// src/stats.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::table::Table;

/// Per-table delivery counts.
///
/// `delivered + failed == total_rows` always holds. `ncpr_failed` is counted
/// from the cause column on its own, so it is bounded by `total_rows` but not
/// by `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    pub total_rows: u64,
    pub delivered: u64,
    pub failed: u64,
    pub ncpr_failed: u64,
    pub sender_ids: BTreeSet<String>,
}

impl TableStats {
    /// Fold another table's stats into this one (sums + sender union).
    pub fn merge(&mut self, other: TableStats) {
        self.total_rows += other.total_rows;
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.ncpr_failed += other.ncpr_failed;
        self.sender_ids.extend(other.sender_ids);
    }
}

/// Outcome of running the extractor over one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Counted(TableStats),
    /// One or more required columns were absent; the table contributes nothing.
    Skipped { missing: Vec<String> },
}

impl Extraction {
    pub fn into_stats(self) -> TableStats {
        match self {
            Extraction::Counted(stats) => stats,
            Extraction::Skipped { .. } => TableStats::default(),
        }
    }
}

/// Column names and labels the extractor matches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extractor {
    pub status_column: String,
    pub cause_column: String,
    pub sender_column: String,
    pub delivered_status: String,
    pub subtype_cause: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor {
            status_column: "Status".into(),
            cause_column: "Cause".into(),
            sender_column: "SenderId".into(),
            delivered_status: "DELIVERED".into(),
            subtype_cause: "NCPR FAIL".into(),
        }
    }
}

impl Extractor {
    pub fn required_columns(&self) -> [&str; 3] {
        [
            self.status_column.as_str(),
            self.cause_column.as_str(),
            self.sender_column.as_str(),
        ]
    }

    /// Count delivered / failed / subtype rows and collect sender ids.
    pub fn extract(&self, table: &Table) -> Extraction {
        let missing: Vec<String> = self
            .required_columns()
            .iter()
            .filter(|c| table.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect();

        let (Some(status), Some(cause), Some(sender)) = (
            table.column(&self.status_column),
            table.column(&self.cause_column),
            table.column(&self.sender_column),
        ) else {
            return Extraction::Skipped { missing };
        };

        let delivered_label = self.delivered_status.to_uppercase();
        let subtype_label = self.subtype_cause.to_uppercase();

        let total_rows = table.len() as u64;
        let delivered = status
            .filter(|c| c.to_string().to_uppercase() == delivered_label)
            .count() as u64;
        let ncpr_failed = cause
            .filter(|c| c.to_string().to_uppercase() == subtype_label)
            .count() as u64;
        let sender_ids = sender.map(|c| c.to_string()).collect();

        Extraction::Counted(TableStats {
            total_rows,
            delivered,
            failed: total_rows - delivered,
            ncpr_failed,
            sender_ids,
        })
    }
}
