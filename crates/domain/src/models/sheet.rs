//! In-memory worksheet grid produced by the workbook reader.

use std::collections::BTreeMap;

use shared::cell::{column_letters_from_index, CellRef};

use super::raw_row::{RawRow, RowMeta};

/// One worksheet, fully materialized as trimmed cell text.
///
/// The grid is dense and 0-based internally; all public addressing uses
/// 1-based rows and column letters to match what administrators configure.
/// Holding a `SheetGrid` holds no file handle: the reader releases the
/// underlying workbook before returning it.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    title: String,
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(title: String, rows: Vec<Vec<String>>) -> Self {
        Self { title, rows }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Total number of rows (including header rows).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell text at a parsed reference; empty for out-of-range cells.
    pub fn cell(&self, cell: &CellRef) -> &str {
        let Some(row_idx) = cell.row.checked_sub(1) else {
            return "";
        };
        self.rows
            .get(row_idx as usize)
            .and_then(|r| r.get(cell.column_index() as usize))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell text at an `A1`-style reference; empty for malformed or
    /// out-of-range references.
    pub fn cell_at(&self, reference: &str) -> &str {
        match CellRef::parse(reference) {
            Ok(cell) => self.cell(&cell),
            Err(_) => "",
        }
    }

    /// Data rows from `start_row` (1-based) to the end of the sheet as
    /// column-letter maps, with fully blank rows dropped.
    pub fn rows_from(&self, start_row: u32, channel_code: &str) -> Vec<RawRow> {
        let start = (start_row.max(1) - 1) as usize;
        let mut out = Vec::new();
        for (offset, row) in self.rows.iter().enumerate().skip(start) {
            let mut cells = BTreeMap::new();
            for (col, value) in row.iter().enumerate() {
                cells.insert(column_letters_from_index(col as u32), value.clone());
            }
            let raw = RawRow::new(
                cells,
                RowMeta {
                    sheet: self.title.clone(),
                    row: (offset + 1) as u32,
                    channel_code: channel_code.to_string(),
                },
            );
            if raw.is_blank() {
                continue;
            }
            out.push(raw);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SheetGrid {
        SheetGrid::new(
            "주문목록".into(),
            vec![
                vec!["주문번호".into(), "수취인".into()],
                vec!["X-1".into(), "김".into()],
                vec!["".into(), "".into()],
                vec!["X-2".into(), "이".into()],
            ],
        )
    }

    #[test]
    fn test_cell_addressing() {
        let g = grid();
        assert_eq!(g.cell_at("A1"), "주문번호");
        assert_eq!(g.cell_at("B2"), "김");
        assert_eq!(g.cell_at("C1"), "");
        assert_eq!(g.cell_at("A99"), "");
        assert_eq!(g.cell_at("not-a-ref"), "");
    }

    #[test]
    fn test_rows_from_drops_blank_rows() {
        let g = grid();
        let rows = g.rows_from(2, "smartstore");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell("A"), "X-1");
        assert_eq!(rows[1].cell("A"), "X-2");
        // provenance points at the worksheet row, not the output index
        assert_eq!(rows[0].meta().row, 2);
        assert_eq!(rows[1].meta().row, 4);
    }

    #[test]
    fn test_rows_from_start_row_one_includes_header() {
        let g = grid();
        let rows = g.rows_from(1, "smartstore");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cell("A"), "주문번호");
    }

    #[test]
    fn test_no_all_empty_rows_ever_yielded() {
        let g = SheetGrid::new("empty".into(), vec![vec!["".into()], vec![]]);
        assert!(g.rows_from(1, "c").is_empty());
    }
}
