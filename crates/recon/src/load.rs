//! Bytes → raw table → catalog.
//!
//! Bid exports carry a preamble (project title, bid date) above the header
//! and are often Windows-1252 encoded. The header row is found by alias
//! recognition rather than position.

use std::fmt;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::alias::{Field, HeaderMap};
use crate::catalog::{build_catalog, BidCatalog};
use crate::error::BidError;
use crate::model::RowDiagnostics;
use crate::normalize::{bidder_columns, normalize_long, normalize_wide, Normalized};

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(20\d{2})").unwrap());
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());

/// Recognized fields a row needs before it is taken as the header.
const MIN_HEADER_FIELDS: usize = 2;

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode file bytes. A UTF-8 BOM is dropped; invalid UTF-8 is read as
/// Windows-1252 (Excel CSV exports).
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

// ---------------------------------------------------------------------------
// Raw table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One row per contractor per item.
    Long,
    /// One row per item, a column group per contractor.
    Worksheet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source_file: String,
    pub project_name: Option<String>,
    /// Row directly above the header; empty when the header is row 1.
    pub banner: Vec<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based row number of the header.
    pub header_row: usize,
}

impl RawTable {
    /// Worksheet when there is no contractor column and the banner names a
    /// bidder over at least one unit price column group.
    pub fn layout(&self) -> Layout {
        let map = HeaderMap::from_header(&self.header);
        if !map.has(Field::Contractor) && !bidder_columns(&map, &self.banner).is_empty() {
            Layout::Worksheet
        } else {
            Layout::Long
        }
    }

    pub fn normalize(&self) -> Normalized {
        let first_row = self.header_row + 1;
        match self.layout() {
            Layout::Long => normalize_long(&self.source_file, &self.header, &self.rows, first_row),
            Layout::Worksheet => {
                normalize_wide(&self.source_file, &self.banner, &self.header, &self.rows, first_row)
            }
        }
    }
}

/// The CSV reader drops empty lines. Give each one a lone separator so it
/// reads back as a blank record and later row numbers match the file.
fn mark_empty_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_quotes = false;
    let mut closed_quote = false;
    let mut field_start = true;
    let mut line_start = true;

    for c in text.chars() {
        if in_quotes {
            if c == '"' {
                in_quotes = false;
                closed_quote = true;
            }
            out.push(c);
            continue;
        }
        // A quote opens a quoted field only at field start; `""` after a
        // closing quote is an escaped quote.
        if c == '"' && (field_start || closed_quote) {
            in_quotes = true;
        }
        closed_quote = false;
        if line_start && (c == '\n' || c == '\r') {
            out.push(',');
        }
        field_start = matches!(c, ',' | '\n' | '\r');
        line_start = c == '\n';
        out.push(c);
    }
    out
}

/// Parse CSV text and locate the header row.
pub fn read_table(source_file: &str, text: &str) -> Result<RawTable, BidError> {
    let text = mark_empty_lines(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| BidError::Csv {
            source: source_file.to_string(),
            message: e.to_string(),
        })?;
        records.push(record.iter().map(|f| f.to_string()).collect());
    }

    if records.iter().all(|r| r.iter().all(|c| c.trim().is_empty())) {
        return Err(BidError::EmptyFile { source: source_file.to_string() });
    }

    let header_idx = records
        .iter()
        .position(|r| HeaderMap::from_header(r).recognized() >= MIN_HEADER_FIELDS)
        .ok_or_else(|| BidError::MissingHeader { source: source_file.to_string() })?;

    let project_name = if header_idx > 0 {
        records[0].first().and_then(|c| clean_project_name(c))
    } else {
        None
    };
    let banner = if header_idx > 0 { records[header_idx - 1].clone() } else { Vec::new() };
    let rows = records.split_off(header_idx + 1);
    let header = records.swap_remove(header_idx);

    debug!(
        "{source_file}: header at row {}, {} data rows",
        header_idx + 1,
        rows.len()
    );

    Ok(RawTable {
        source_file: source_file.to_string(),
        project_name,
        banner,
        header,
        rows,
        header_row: header_idx + 1,
    })
}

fn clean_project_name(raw: &str) -> Option<String> {
    let name = PARENTHETICAL.replace_all(raw, "");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Catalog label for a file: the first `20xx` year in the file name, else
/// the file stem.
pub fn file_label(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if let Some(year) = YEAR.captures(name).and_then(|c| c.get(1)) {
        return year.as_str().to_string();
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
        .to_string()
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// One bid file, loaded and cataloged.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    pub catalog: BidCatalog,
    pub diagnostics: RowDiagnostics,
}

/// A file that could not be cataloged. `diagnostics` is set when the rows
/// were read, so a file whose every row was skipped still reports why.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub error: BidError,
    pub diagnostics: Option<RowDiagnostics>,
}

impl From<BidError> for LoadFailure {
    fn from(error: BidError) -> Self {
        Self { error, diagnostics: None }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for LoadFailure {}

/// Decode, parse, normalize and catalog one file's bytes.
///
/// Row problems land in the diagnostics. The file fails only when it cannot
/// be parsed, has no header, or yields no usable line items.
pub fn load_bytes(source_file: &str, label: &str, bytes: &[u8]) -> Result<LoadedFile, LoadFailure> {
    let text = decode_text(bytes);
    let table = read_table(source_file, &text)?;
    let Normalized { items, diagnostics } = table.normalize();

    if items.is_empty() {
        debug!(
            "{source_file}: no usable line items ({} rows read, {} skipped)",
            diagnostics.rows_read, diagnostics.skipped
        );
        return Err(LoadFailure {
            error: BidError::EmptyFile { source: source_file.to_string() },
            diagnostics: Some(diagnostics),
        });
    }

    let catalog = build_catalog(items, label)?.with_project_name(table.project_name);
    Ok(LoadedFile { catalog, diagnostics })
}

pub fn load_file(path: &Path, label: Option<&str>) -> Result<LoadedFile, LoadFailure> {
    let bytes = std::fs::read(path).map_err(|e| BidError::Io(format!("{}: {e}", path.display())))?;
    let label = match label {
        Some(l) => l.to_string(),
        None => file_label(path),
    };
    load_bytes(&path.display().to_string(), &label, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_is_stripped() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFSection,Item"), "Section,Item");
    }

    #[test]
    fn windows_1252_fallback() {
        // 0xE9 = é in Windows-1252, invalid as UTF-8
        assert_eq!(decode_text(b"Caf\xE9 Paving"), "Café Paving");
    }

    #[test]
    fn header_found_below_preamble() {
        let text = "County Road 12 Resurfacing (Rebid),,\nBid date: 2024-03-01,,\n\
                    Section,Contractor,Description,Unit,Qty,Unit Price\n\
                    Paving,Acme,Asphalt,SY,100,10.00\n";
        let table = read_table("bids.csv", text).unwrap();
        assert_eq!(table.header_row, 3);
        assert_eq!(table.project_name.as_deref(), Some("County Road 12 Resurfacing"));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.layout(), Layout::Long);

        let out = table.normalize();
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].row, 4);
    }

    #[test]
    fn empty_lines_keep_row_numbers() {
        assert_eq!(mark_empty_lines("a,b\n\nc,d\n"), "a,b\n,\nc,d\n");
        assert_eq!(mark_empty_lines("a\r\n\r\nb"), "a\r\n,\r\nb");
        // Empty line inside a quoted cell is data, not a row.
        assert_eq!(mark_empty_lines("\"x\n\ny\",1\n"), "\"x\n\ny\",1\n");
        assert_eq!(mark_empty_lines("Pipe 12\",1\n\n"), "Pipe 12\",1\n,\n");

        let text = "Section,Contractor,Description,Unit,Qty,Unit Price\n\n\
                    Paving,Acme,Asphalt,SY,100,10.00\n";
        let out = read_table("bids.csv", text).unwrap().normalize();
        assert_eq!(out.items[0].row, 3);
        assert_eq!(out.diagnostics.blank, 1);
    }

    #[test]
    fn header_on_first_row_has_no_project_name() {
        let table = read_table("bids.csv", "Description,Unit Price\nAsphalt,10\n").unwrap();
        assert_eq!(table.header_row, 1);
        assert_eq!(table.project_name, None);
        assert!(table.banner.is_empty());
    }

    #[test]
    fn missing_header_is_an_error() {
        let err = read_table("notes.csv", "hello,world\n1,2\n").unwrap_err();
        assert_eq!(err, BidError::MissingHeader { source: "notes.csv".into() });
    }

    #[test]
    fn empty_text_is_an_empty_file() {
        assert!(matches!(read_table("e.csv", ""), Err(BidError::EmptyFile { .. })));
        assert!(matches!(read_table("e.csv", ",,\n,,\n"), Err(BidError::EmptyFile { .. })));
    }

    #[test]
    fn worksheet_layout_detected() {
        let text = ",,,Acme,,\nItem,Unit,Quantity,Unit Price,Extension\nCurb,LF,10,5.00,50.00\n";
        let table = read_table("w.csv", text).unwrap();
        assert_eq!(table.layout(), Layout::Worksheet);
        let out = table.normalize();
        assert_eq!(out.items[0].contractor, "Acme");
        assert_eq!(out.items[0].row, 3);
    }

    #[test]
    fn labels_from_file_names() {
        assert_eq!(file_label(Path::new("data/Bid Tab 2023 Final.csv")), "2023");
        assert_eq!(file_label(Path::new("bids-2024-rev2.csv")), "2024");
        assert_eq!(file_label(Path::new("north-county.csv")), "north-county");
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = load_bytes("h.csv", "h", b"Section,Contractor,Description,Unit Price\n").unwrap_err();
        assert_eq!(err.error, BidError::EmptyFile { source: "h.csv".into() });
        assert_eq!(err.diagnostics.map(|d| d.rows_read), Some(0));
    }

    #[test]
    fn all_rows_skipped_keeps_reasons() {
        let bytes = b"Section,Contractor,Description,Unit,Qty,Unit Price\n\
                      Paving,Acme,Asphalt,SY,N/A,10\nPaving,Beta,Asphalt,SY,100,TBD\n";
        let err = load_bytes("na.csv", "na", bytes).unwrap_err();
        assert!(matches!(err.error, BidError::EmptyFile { .. }));

        let diag = err.diagnostics.expect("rows were read");
        assert_eq!(diag.skipped, 2);
        assert_eq!(diag.skipped_rows[0].row, 2);
        assert!(diag.skipped_rows[0].reason.contains("N/A"));
        assert!(diag.skipped_rows[1].reason.contains("TBD"));
    }

    #[test]
    fn parse_failures_carry_no_diagnostics() {
        let err = load_bytes("notes.csv", "notes", b"hello,world\n").unwrap_err();
        assert_eq!(err.error, BidError::MissingHeader { source: "notes.csv".into() });
        assert_eq!(err.diagnostics, None);
    }

    #[test]
    fn title_over_text_column_stays_long() {
        let text = "County Job,,,\nDescription,Unit,Qty,Unit Price\nCurb,LF,10,5.00\n";
        let table = read_table("job.csv", text).unwrap();
        assert_eq!(table.project_name.as_deref(), Some("County Job"));
        assert_eq!(table.layout(), Layout::Long);

        let out = table.normalize();
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].contractor, "");
        assert_eq!(out.items[0].unit_price, 5.0);
    }

    #[test]
    fn load_bytes_builds_catalog() {
        let bytes = b"Paving Job (2024),,,,\nSection,Bidder,Item,Unit,Unit Price\n\
                      Paving,Acme,Asphalt,SY,10\nPaving,Beta,Asphalt,SY,11\n";
        let loaded = load_bytes("p.csv", "2024", bytes).unwrap();
        assert_eq!(loaded.catalog.label(), "2024");
        assert_eq!(loaded.catalog.project_name(), Some("Paving Job"));
        assert_eq!(loaded.catalog.roster().len(), 2);
        // Quantity column absent: items kept and flagged.
        assert_eq!(loaded.diagnostics.incomplete, 2);
    }

    #[test]
    fn load_file_with_label_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimate-2024.csv");
        std::fs::write(
            &path,
            b"Section,Contractor,Description,Unit,Qty,Unit Price\nPaving,Caf\xE9 Paving,Asphalt,SY,10,5\n",
        )
        .unwrap();

        let loaded = load_file(&path, Some("engineer")).unwrap();
        assert_eq!(loaded.catalog.label(), "engineer");
        assert_eq!(loaded.catalog.items()[0].contractor, "Café Paving");
        assert_eq!(loaded.catalog.items()[0].extended_price, 50.0);

        let missing = load_file(&dir.path().join("nope.csv"), None).unwrap_err();
        assert!(matches!(missing.error, BidError::Io(_)));
    }
}
