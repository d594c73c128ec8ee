use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker written into every workbook so foreign JSON is rejected early
pub const WORKBOOK_FORMAT: &str = "tabdo-workbook";
pub const WORKBOOK_VERSION: u32 = 1;

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text form of the cell. Integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Boolean reading: true/false, "true"/"false"/"1"/"0", numbers != 0
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Number(n) => Some(*n != 0.0),
            Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// A row keyed by column name. Missing keys are empty cells.
pub type Record = IndexMap<String, Cell>;

/// A named table with a header row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl Sheet {
    /// Build a sheet from records. The header is the union of record keys in
    /// first-seen order.
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| record.get(c).cloned()).collect())
            .collect();
        Sheet { columns, rows }
    }

    /// Read rows back as records keyed by column name. Empty cells and cells
    /// beyond the header are dropped.
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .filter_map(|(col, cell)| cell.clone().map(|c| (col.clone(), c)))
                    .collect()
            })
            .collect()
    }
}

/// An ordered collection of named sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub sheets: IndexMap<String, Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook {
            format: WORKBOOK_FORMAT.to_string(),
            version: WORKBOOK_VERSION,
            sheets: IndexMap::new(),
        }
    }
}

/// Error type for workbook encoding/decoding
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("workbook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a workbook (format marker '{0}')")]
    WrongFormat(String),
    #[error("unsupported workbook version {0}")]
    UnsupportedVersion(u32),
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a sheet
    pub fn append_sheet(&mut self, name: &str, sheet: Sheet) {
        self.sheets.insert(name.to_string(), sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Serialize to the text form stored in the key-value store and in
    /// exported files
    pub fn to_text(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self, CodecError> {
        let wb: Workbook = serde_json::from_str(text)?;
        if wb.format != WORKBOOK_FORMAT {
            return Err(CodecError::WrongFormat(wb.format));
        }
        if wb.version > WORKBOOK_VERSION {
            return Err(CodecError::UnsupportedVersion(wb.version));
        }
        Ok(wb)
    }
}
