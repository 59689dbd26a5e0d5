//! Verbatim source rows, preserved for audit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provenance of one source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    /// Worksheet title.
    pub sheet: String,
    /// 1-based worksheet row number.
    pub row: u32,
    /// Channel code the file was uploaded for.
    pub channel_code: String,
}

/// One source row as a column-letter → trimmed-text map.
///
/// The map is the audit source of truth: it is serialized verbatim into the
/// order's raw payload and hashed. Cell iteration follows spreadsheet column
/// order (`A`..`Z`, `AA`..), not lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: BTreeMap<String, String>,
    meta: RowMeta,
}

impl RawRow {
    pub fn new(cells: BTreeMap<String, String>, meta: RowMeta) -> Self {
        Self { cells, meta }
    }

    /// Cell text for a column letter; empty string when the column is absent.
    pub fn cell(&self, column: &str) -> &str {
        self.cells
            .get(&column.trim().to_ascii_uppercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// True when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.is_empty())
    }

    pub fn meta(&self) -> &RowMeta {
        &self.meta
    }

    /// Cells in spreadsheet column order.
    pub fn ordered_cells(&self) -> Vec<(&str, &str)> {
        let mut cells: Vec<(&str, &str)> = self
            .cells
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        // Column letters sort by length first: A..Z before AA..
        cells.sort_by_key(|(k, _)| (k.len(), k.to_string()));
        cells
    }

    /// All cell values joined with single spaces, in column order.
    pub fn joined(&self) -> String {
        self.ordered_cells()
            .iter()
            .map(|(_, v)| *v)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Deterministic JSON serialization of the cell map for audit storage.
    pub fn payload_json(&self) -> String {
        serde_json::to_string(&self.cells).unwrap_or_else(|_| "{}".to_string())
    }
}
