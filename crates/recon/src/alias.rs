//! Header alias table.
//!
//! Bid exports name the same column differently ("Item Description",
//! "Description", "Work Item"). Each header cell is folded and looked up in a
//! static table once per file.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::key::normalize_text;

/// Canonical column a header cell can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Section,
    Contractor,
    Description,
    Unit,
    Quantity,
    UnitPrice,
    ExtendedPrice,
    LineNumber,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Section => write!(f, "section"),
            Self::Contractor => write!(f, "contractor"),
            Self::Description => write!(f, "description"),
            Self::Unit => write!(f, "unit"),
            Self::Quantity => write!(f, "quantity"),
            Self::UnitPrice => write!(f, "unit_price"),
            Self::ExtendedPrice => write!(f, "extended_price"),
            Self::LineNumber => write!(f, "line_number"),
        }
    }
}

/// Folded header text → canonical field.
const ALIASES: &[(&str, Field)] = &[
    ("section", Field::Section),
    ("section title", Field::Section),
    ("section name", Field::Section),
    ("division", Field::Section),
    ("category", Field::Section),
    ("contractor", Field::Contractor),
    ("contractor name", Field::Contractor),
    ("bidder", Field::Contractor),
    ("bidder name", Field::Contractor),
    ("vendor", Field::Contractor),
    ("company", Field::Contractor),
    ("description", Field::Description),
    ("item description", Field::Description),
    ("item", Field::Description),
    ("item name", Field::Description),
    ("work item", Field::Description),
    ("unit", Field::Unit),
    ("units", Field::Unit),
    ("uom", Field::Unit),
    ("unit of measure", Field::Unit),
    ("quantity", Field::Quantity),
    ("qty", Field::Quantity),
    ("est qty", Field::Quantity),
    ("estimated quantity", Field::Quantity),
    ("quantity bid", Field::Quantity),
    ("unit price", Field::UnitPrice),
    ("price", Field::UnitPrice),
    ("unit cost", Field::UnitPrice),
    ("bid price", Field::UnitPrice),
    ("rate", Field::UnitPrice),
    ("extension", Field::ExtendedPrice),
    ("extended price", Field::ExtendedPrice),
    ("extended amount", Field::ExtendedPrice),
    ("amount", Field::ExtendedPrice),
    ("total", Field::ExtendedPrice),
    ("line total", Field::ExtendedPrice),
    ("line", Field::LineNumber),
    ("line item", Field::LineNumber),
    ("line no", Field::LineNumber),
    ("item no", Field::LineNumber),
    ("item number", Field::LineNumber),
];

/// Resolve one header cell. A spreadsheet-style duplicate suffix
/// (`Unit Price.1`) is ignored.
pub fn resolve(header: &str) -> Option<Field> {
    let folded = normalize_text(strip_duplicate_suffix(header.trim()));
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map(|(_, field)| *field)
}

fn strip_duplicate_suffix(header: &str) -> &str {
    match header.rsplit_once('.') {
        Some((head, tail))
            if !tail.is_empty()
                && tail.chars().all(|c| c.is_ascii_digit())
                && head.ends_with(|c: char| c.is_alphabetic()) =>
        {
            head
        }
        _ => header,
    }
}

/// Column positions of every recognized field in a header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    columns: BTreeMap<Field, Vec<usize>>,
}

impl HeaderMap {
    pub fn from_header(header: &[String]) -> Self {
        let mut columns: BTreeMap<Field, Vec<usize>> = BTreeMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(field) = resolve(cell) {
                columns.entry(field).or_default().push(idx);
            }
        }
        Self { columns }
    }

    /// First column for a field.
    pub fn first(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).and_then(|v| v.first().copied())
    }

    /// Every column resolving to a field, in header order.
    pub fn all(&self, field: Field) -> &[usize] {
        self.columns.get(&field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Field a given column resolves to, if any.
    pub fn field_at(&self, col: usize) -> Option<Field> {
        self.columns
            .iter()
            .find(|(_, cols)| cols.contains(&col))
            .map(|(field, _)| *field)
    }

    /// Number of distinct fields recognized.
    pub fn recognized(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_aliases_case_insensitively() {
        assert_eq!(resolve("Item Description"), Some(Field::Description));
        assert_eq!(resolve("  QTY "), Some(Field::Quantity));
        assert_eq!(resolve("Unit Price ($)"), Some(Field::UnitPrice));
        assert_eq!(resolve("Section Title"), Some(Field::Section));
        assert_eq!(resolve("Bidder"), Some(Field::Contractor));
        assert_eq!(resolve("Line #"), Some(Field::LineNumber));
    }

    #[test]
    fn ignores_duplicate_suffix() {
        assert_eq!(resolve("Unit Price.1"), Some(Field::UnitPrice));
        assert_eq!(resolve("Extension.12"), Some(Field::ExtendedPrice));
    }

    #[test]
    fn unknown_columns_are_ignored() {
        assert_eq!(resolve("Notes"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn header_map_tracks_repeats() {
        let map = HeaderMap::from_header(&header(&[
            "Section Title",
            "Item Description",
            "Quantity",
            "Unit Price",
            "Extension",
            "Quantity",
            "Unit Price",
            "Extension",
            "Remarks",
        ]));
        assert_eq!(map.first(Field::Section), Some(0));
        assert_eq!(map.all(Field::UnitPrice), &[3, 6]);
        assert_eq!(map.all(Field::Quantity), &[2, 5]);
        assert_eq!(map.field_at(7), Some(Field::ExtendedPrice));
        assert_eq!(map.field_at(8), None);
        assert!(!map.has(Field::Contractor));
        assert_eq!(map.recognized(), 5);
    }
}
