// src/table/mod.rs
use anyhow::Result;
use chrono::NaiveDateTime;
use std::{fmt, io::Cursor};

pub mod delimited;
pub mod sheet;

/// A single loosely-typed value as it came out of a spreadsheet or CSV file.
/// Every comparison goes through the `Display` form.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("nan"),
            Cell::String(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => {
                // whole numbers read back as integers (`1234.0` → `1234`)
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    write!(f, "{}", *v as i64)
                } else if v.is_nan() {
                    f.write_str("nan")
                } else {
                    write!(f, "{}", v)
                }
            }
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Cell::Error(e) => f.write_str(e),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::String(s.to_string())
        }
    }
}

impl Cell {
    /// Infer a cell from delimited text: integers and floats become numbers,
    /// everything else stays text (`00123` → `Int(123)`).
    pub fn from_text_inferred(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else if let Ok(i) = s.parse::<i64>() {
            Cell::Int(i)
        } else if let Some(f) = s
            .bytes()
            .any(|b| b.is_ascii_digit())
            .then(|| s.parse::<f64>().ok())
            .flatten()
        {
            Cell::Float(f)
        } else {
            Cell::String(s.to_string())
        }
    }
}

/// Header row plus records, all rows padded to the header width.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table; header names are trimmed and short rows padded with `Cell::Empty`.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, Cell::Empty);
                }
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Iterate the cells of column `name`, or `None` when the header is absent.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Parse an in-memory archive member by its extension.
    /// Returns `Ok(None)` for member names that are not `.xlsx` or `.csv`.
    pub fn from_member(name: &str, data: Vec<u8>) -> Result<Option<Table>> {
        match TableFormat::from_name(name) {
            Some(TableFormat::Xlsx) => sheet::read_xlsx(Cursor::new(data)).map(Some),
            Some(TableFormat::Csv) => delimited::read_csv(data.as_slice()).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        if has_extension(name, "xlsx") {
            Some(TableFormat::Xlsx)
        } else if has_extension(name, "csv") {
            Some(TableFormat::Csv)
        } else {
            None
        }
    }
}

/// Case-insensitive `name.ends_with(".{ext}")`.
pub fn has_extension(name: &str, ext: &str) -> bool {
    name.to_lowercase()
        .strip_suffix(ext)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some()
}
