//! Raw rows → canonical line items.
//!
//! Two layouts are understood:
//! - long: one row per contractor per item, with a contractor column;
//! - worksheet: one row per item, with a Quantity / Unit Price / Extension
//!   column group per contractor and the contractor names in a banner row
//!   above the header.
//!
//! Bad rows never fail the file. They are counted in [`RowDiagnostics`].

use log::debug;

use crate::alias::{Field, HeaderMap};
use crate::key::normalize_text;
use crate::model::{LineItem, RowDiagnostics, SkippedRow};

/// Items plus the row diagnostics for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub items: Vec<LineItem>,
    pub diagnostics: RowDiagnostics,
}

/// Normalize long-layout rows. Row numbers assume the header is row 1.
pub fn normalize(source_file: &str, header: &[String], rows: &[Vec<String>]) -> Normalized {
    normalize_long(source_file, header, rows, 2)
}

/// Normalize worksheet-layout rows. `banner` holds the contractor names
/// above each Unit Price column. Row numbers assume the header is row 2.
pub fn normalize_worksheet(
    source_file: &str,
    banner: &[String],
    header: &[String],
    rows: &[Vec<String>],
) -> Normalized {
    normalize_wide(source_file, banner, header, rows, 3)
}

pub(crate) fn normalize_long(
    source_file: &str,
    header: &[String],
    rows: &[Vec<String>],
    first_row: usize,
) -> Normalized {
    let map = HeaderMap::from_header(header);
    let mut diag = RowDiagnostics::new(source_file);
    let mut items = Vec::new();
    let mut current_section = String::new();

    let section_col = map.first(Field::Section);
    let contractor_col = map.first(Field::Contractor);
    let description_col = map.first(Field::Description);
    let unit_col = map.first(Field::Unit);
    let line_col = map.first(Field::LineNumber);
    let qty_col = map.first(Field::Quantity);
    let price_col = map.first(Field::UnitPrice);
    let ext_col = map.first(Field::ExtendedPrice);

    for (offset, row) in rows.iter().enumerate() {
        let row_no = first_row + offset;
        diag.rows_read += 1;

        if is_blank(row) {
            diag.blank += 1;
            continue;
        }

        let section_cell = cell(row, section_col);
        let description = cell(row, description_col);
        let unit = cell(row, unit_col);
        let qty = read_number(row, qty_col);
        let price = read_number(row, price_col);
        let ext = read_number(row, ext_col);

        let priced = !unit.is_empty() || !qty.is_missing() || !price.is_missing();
        if is_summary_row(section_cell, description, priced) {
            diag.summary_rows += 1;
            continue;
        }
        if !section_cell.is_empty() {
            current_section = section_cell.to_string();
        }

        let contractor = cell(row, contractor_col);
        if description.is_empty()
            && contractor.is_empty()
            && qty.is_missing()
            && price.is_missing()
            && ext.is_missing()
        {
            diag.headings += 1;
            continue;
        }

        if let Some(reason) = first_invalid(&[
            (Field::Quantity, &qty),
            (Field::UnitPrice, &price),
            (Field::ExtendedPrice, &ext),
        ]) {
            diag.skipped += 1;
            diag.skipped_rows.push(SkippedRow { row: row_no, reason });
            continue;
        }

        let item = build_item(
            source_file,
            row_no,
            cell(row, line_col),
            &current_section,
            contractor,
            description,
            unit,
            &qty,
            &price,
            &ext,
        );
        if item.incomplete {
            diag.incomplete += 1;
        }
        items.push(item);
    }

    diag.emitted = items.len();
    debug!(
        "{source_file}: {} rows read, {} items, {} incomplete, {} skipped",
        diag.rows_read, diag.emitted, diag.incomplete, diag.skipped
    );
    Normalized { items, diagnostics: diag }
}

/// Column group of one contractor in a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BidderColumns {
    name: String,
    quantity: Option<usize>,
    unit_price: usize,
    extension: Option<usize>,
}

/// Bidder column groups of a worksheet header. A bidder's name must sit in
/// the banner over its own group (quantity, unit price, extension); text
/// elsewhere in that row, such as a job title, is not a bidder.
pub(crate) fn bidder_columns(map: &HeaderMap, banner: &[String]) -> Vec<BidderColumns> {
    let quantity_cols = map.all(Field::Quantity);
    let mut bidders = Vec::new();

    let mut floor = 0;
    for &price_col in map.all(Field::UnitPrice) {
        // Nearest quantity column to the left: the bidder's own, or the
        // shared one when bidders only carry price and extension.
        let quantity = quantity_cols.iter().rev().copied().find(|&c| c < price_col);
        let extension = Some(price_col + 1).filter(|&c| map.field_at(c) == Some(Field::ExtendedPrice));

        let first = quantity.filter(|&q| q >= floor).unwrap_or(price_col);
        let last = extension.unwrap_or(price_col);
        floor = last + 1;

        let name = (first..=last)
            .filter_map(|c| banner.get(c))
            .map(|s| clean_banner_name(s))
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        if name.is_empty() {
            debug!("unit price column {price_col} has no bidder name in banner row; ignored");
            continue;
        }

        bidders.push(BidderColumns {
            name,
            quantity,
            unit_price: price_col,
            extension,
        });
    }

    bidders
}

fn clean_banner_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '"' || c.is_whitespace()).to_string()
}

pub(crate) fn normalize_wide(
    source_file: &str,
    banner: &[String],
    header: &[String],
    rows: &[Vec<String>],
    first_row: usize,
) -> Normalized {
    let map = HeaderMap::from_header(header);
    let bidders = bidder_columns(&map, banner);
    let mut diag = RowDiagnostics::new(source_file);
    let mut items = Vec::new();
    let mut current_section = String::new();

    let section_col = map.first(Field::Section);
    let description_col = map.first(Field::Description);
    let unit_col = map.first(Field::Unit);
    let line_col = map.first(Field::LineNumber);

    for (offset, row) in rows.iter().enumerate() {
        let row_no = first_row + offset;
        diag.rows_read += 1;

        if is_blank(row) {
            diag.blank += 1;
            continue;
        }

        let section_cell = cell(row, section_col);
        let description = cell(row, description_col);
        let priced = !cell(row, unit_col).is_empty()
            || bidders.iter().any(|b| {
                !read_number(row, Some(b.unit_price)).is_missing() || !read_number(row, b.quantity).is_missing()
            });
        if is_summary_row(section_cell, description, priced) {
            diag.summary_rows += 1;
            continue;
        }
        if !section_cell.is_empty() {
            current_section = section_cell.to_string();
        }
        if description.is_empty() {
            diag.headings += 1;
            continue;
        }

        for bidder in &bidders {
            let price = read_number(row, Some(bidder.unit_price));
            let ext = read_number(row, bidder.extension);
            // No price and no extension: this bidder did not price the item.
            if price.is_missing() && ext.is_missing() {
                continue;
            }
            let qty = read_number(row, bidder.quantity);

            if let Some(reason) = first_invalid(&[
                (Field::Quantity, &qty),
                (Field::UnitPrice, &price),
                (Field::ExtendedPrice, &ext),
            ]) {
                diag.skipped += 1;
                diag.skipped_rows.push(SkippedRow {
                    row: row_no,
                    reason: format!("{}: {reason}", bidder.name),
                });
                continue;
            }

            let item = build_item(
                source_file,
                row_no,
                cell(row, line_col),
                &current_section,
                &bidder.name,
                description,
                cell(row, unit_col),
                &qty,
                &price,
                &ext,
            );
            if item.incomplete {
                diag.incomplete += 1;
            }
            items.push(item);
        }
    }

    diag.emitted = items.len();
    debug!(
        "{source_file}: worksheet with {} bidders, {} rows read, {} items, {} skipped",
        bidders.len(),
        diag.rows_read,
        diag.emitted,
        diag.skipped
    );
    Normalized { items, diagnostics: diag }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Subtotal and grand-total lines repeat amounts already carried by items.
///
/// A total label in the section cell always marks a summary row. In the
/// description it does so only when the row carries no unit, quantity or
/// unit price, so a priced item such as "Total Station Layout" is kept.
fn is_summary_row(section_cell: &str, description: &str, priced: bool) -> bool {
    is_total_label(section_cell) || (!priced && is_total_label(description))
}

fn is_total_label(text: &str) -> bool {
    let folded = normalize_text(text);
    folded.contains("base bid total")
        || folded.contains("subtotal")
        || folded == "total"
        || folded.starts_with("total ")
        || folded.starts_with("grand total")
}

#[derive(Debug, Clone, PartialEq)]
enum NumericCell {
    /// Column absent from the header, or the cell is empty.
    Missing,
    Value(f64),
    Invalid(String),
}

impl NumericCell {
    fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

fn read_number(row: &[String], idx: Option<usize>) -> NumericCell {
    let raw = cell(row, idx);
    if raw.is_empty() {
        return NumericCell::Missing;
    }
    match parse_amount(raw) {
        Some(v) if v >= 0.0 => NumericCell::Value(v),
        Some(_) => NumericCell::Invalid(format!("negative value '{raw}'")),
        None => NumericCell::Invalid(format!("non-numeric value '{raw}'")),
    }
}

fn first_invalid(cells: &[(Field, &NumericCell)]) -> Option<String> {
    cells.iter().find_map(|(field, c)| match c {
        NumericCell::Invalid(msg) => Some(format!("{field}: {msg}")),
        _ => None,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_item(
    source_file: &str,
    row: usize,
    line_no: &str,
    section: &str,
    contractor: &str,
    description: &str,
    unit: &str,
    qty: &NumericCell,
    price: &NumericCell,
    ext: &NumericCell,
) -> LineItem {
    let quantity = qty.value().unwrap_or(0.0);
    let unit_price = price.value().unwrap_or(0.0);
    let extended_price = ext.value().unwrap_or(quantity * unit_price);

    LineItem {
        source_file: source_file.to_string(),
        row,
        line_no: (!line_no.is_empty()).then(|| line_no.to_string()),
        section: section.to_string(),
        contractor: contractor.to_string(),
        description: description.to_string(),
        unit: unit.to_string(),
        quantity,
        unit_price,
        extended_price,
        incomplete: qty.is_missing() || price.is_missing(),
    }
}

// ---------------------------------------------------------------------------
// Numeric parsing for bid amounts
// ---------------------------------------------------------------------------

/// Parse an amount as exported by estimating tools:
/// - Strip `$`, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_amount(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if is_negative { -value } else { value })
}
