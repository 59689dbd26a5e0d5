//! Workbook reading: turns a spreadsheet file into an in-memory
//! [`SheetGrid`].
//!
//! Some channels export an HTML table mislabeled with a spreadsheet
//! extension. The first ~2KB are sniffed for HTML tags; such files are
//! re-parsed as HTML, honoring a declared charset and defaulting to UTF-8.
//! Everything else goes through the native reader, where formula cells
//! yield their cached calculated value and date-formatted cells surface
//! their raw serial so the normalizer treats every input uniformly.
//!
//! The whole sheet is materialized before returning; no file handle
//! outlives the call. Unreadable input is a fatal decode error and no
//! partial grid is ever returned.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use domain::error::IngestError;
use domain::models::SheetGrid;

/// How much of the file is sniffed for HTML tags.
const SNIFF_LEN: usize = 2048;

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"(?i)<\s*(html|table|thead|tr|td)\b").unwrap();
    static ref CHARSET_RE: Regex =
        Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).unwrap();
    static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Open a workbook and materialize its first worksheet.
pub fn open(path: &Path) -> Result<SheetGrid, IngestError> {
    let head = read_head(path)?;
    if HTML_TAG_RE.is_match(&String::from_utf8_lossy(&head)) {
        let bytes = std::fs::read(path)
            .map_err(|e| IngestError::Decode(format!("{}: {e}", path.display())))?;
        return open_html(&bytes);
    }
    open_native(path)
}

fn read_head(path: &Path) -> Result<Vec<u8>, IngestError> {
    let mut file =
        File::open(path).map_err(|e| IngestError::Decode(format!("{}: {e}", path.display())))?;
    let mut head = vec![0u8; SNIFF_LEN];
    let n = file
        .read(&mut head)
        .map_err(|e| IngestError::Decode(format!("{}: {e}", path.display())))?;
    head.truncate(n);
    Ok(head)
}

fn open_native(path: &Path) -> Result<SheetGrid, IngestError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::Decode(e.to_string()))?;

    let title = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::Decode("workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&title)
        .map_err(|e| IngestError::Decode(e.to_string()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    if let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
    {
        rows = vec![vec![String::new(); (end_col + 1) as usize]; (end_row + 1) as usize];
        for (r, c, value) in range.used_cells() {
            let text = cell_text(value);
            rows[start_row as usize + r][start_col as usize + c] = text.trim().to_string();
        }
    }

    Ok(SheetGrid::new(title, rows))
}

/// Render a native cell as the text an administrator would see.
fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        // raw serial; the date normalizer owns the conversion
        Data::DateTime(dt) => float_text(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Integer-valued floats print without a trailing `.0` so order numbers and
/// quantities survive the float round-trip.
fn float_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn open_html(bytes: &[u8]) -> Result<SheetGrid, IngestError> {
    let text = decode_html(bytes);
    let document = Html::parse_document(&text);

    let table_sel = Selector::parse("table").expect("static selector");
    let row_sel = Selector::parse("tr").expect("static selector");
    let cell_sel = Selector::parse("td, th").expect("static selector");

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| IngestError::Decode("no <table> found in HTML workbook".to_string()))?;

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let row: Vec<String> = tr
            .select(&cell_sel)
            .map(|cell| {
                let text: String = cell.text().collect();
                WS_RE.replace_all(text.trim(), " ").into_owned()
            })
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(IngestError::Decode(
            "HTML workbook table has no rows".to_string(),
        ));
    }

    Ok(SheetGrid::new("Worksheet".to_string(), rows))
}

/// Decode HTML bytes, honoring a declared charset and defaulting to UTF-8
/// when none is declared.
fn decode_html(bytes: &[u8]) -> String {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]).into_owned();
    if let Some(caps) = CHARSET_RE.captures(&head) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(caps[1].as_bytes()) {
            let (text, _, _) = encoding.decode(bytes);
            return text.into_owned();
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}
