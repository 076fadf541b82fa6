//! Derived datasets: contractor totals, year-over-year totals, section tables.

use serde::Serialize;
use serde_json::json;

use crate::delta::{pct_change, round_pct};
use crate::filter::FilteredView;
use crate::model::{DerivedDataset, MatchedGroups};
use crate::rank::{section_totals, SectionTotals};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedTables {
    pub contractor_totals: DerivedDataset,
    pub yoy_totals: DerivedDataset,
    pub section_totals: DerivedDataset,
    pub section_breakdown: DerivedDataset,
    /// Selected contractors with no items in the filtered view.
    pub missing_contractors: Vec<String>,
}

pub fn build_derived(view: &FilteredView<'_>, matched: &MatchedGroups) -> DerivedTables {
    let sections = section_totals(matched.all_groups());
    let totals = catalog_totals(&sections);

    DerivedTables {
        contractor_totals: build_contractor_totals(&totals, &matched.catalog_labels),
        yoy_totals: build_yoy_totals(&totals, &matched.catalog_labels),
        section_totals: build_section_totals(&sections),
        section_breakdown: build_section_breakdown(view),
        missing_contractors: view.missing_contractors.clone(),
    }
}

// ---------------------------------------------------------------------------
// Contractor totals
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CatalogTotal {
    catalog_index: usize,
    contractor_key: String,
    contractor: String,
    first_row: usize,
    total: f64,
}

/// Whole-bid total per (catalog, contractor): the sum of its section totals.
fn catalog_totals(sections: &[SectionTotals]) -> Vec<CatalogTotal> {
    let mut out: Vec<CatalogTotal> = Vec::new();
    for s in sections {
        for c in &s.contractors {
            match out
                .iter_mut()
                .find(|t| t.catalog_index == s.catalog_index && t.contractor_key == c.contractor_key)
            {
                Some(t) => {
                    t.total += c.total;
                    if c.first_row < t.first_row {
                        t.first_row = c.first_row;
                        t.contractor = c.contractor.clone();
                    }
                }
                None => out.push(CatalogTotal {
                    catalog_index: s.catalog_index,
                    contractor_key: c.contractor_key.clone(),
                    contractor: c.contractor.clone(),
                    first_row: c.first_row,
                    total: c.total,
                }),
            }
        }
    }
    out.sort_by_key(|t| (t.catalog_index, t.first_row));
    out
}

/// `contractor_totals.v1`: one row per contractor per catalog.
fn build_contractor_totals(totals: &[CatalogTotal], labels: &[String]) -> DerivedDataset {
    let mut dataset = DerivedDataset::new("contractor_totals");
    for t in totals {
        dataset.rows.push(json!({
            "catalog": labels.get(t.catalog_index),
            "contractor": t.contractor,
            "total": t.total,
        }));
    }
    dataset.enforce_limit();
    dataset
}

/// `yoy_totals.v1`: contractor × catalog matrix. A catalog the contractor did
/// not bid in is `null`. The change runs from the first to the last catalog
/// the contractor appears in, and is `null` without a positive baseline or a
/// second catalog.
fn build_yoy_totals(totals: &[CatalogTotal], labels: &[String]) -> DerivedDataset {
    let mut dataset = DerivedDataset::new("yoy_totals");

    let mut contractors: Vec<(&str, &str)> = Vec::new();
    for t in totals {
        if !contractors.iter().any(|(key, _)| *key == t.contractor_key) {
            contractors.push((t.contractor_key.as_str(), t.contractor.as_str()));
        }
    }

    for (key, name) in contractors {
        let by_catalog: Vec<Option<f64>> = (0..labels.len())
            .map(|i| {
                totals
                    .iter()
                    .find(|t| t.catalog_index == i && t.contractor_key == key)
                    .map(|t| t.total)
            })
            .collect();

        let present: Vec<(usize, f64)> = by_catalog
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
            .collect();
        let change = match (present.first(), present.last()) {
            (Some(&(fi, first)), Some(&(li, last))) if fi != li => pct_change(first, last),
            _ => None,
        };

        let cells: Vec<serde_json::Value> = labels
            .iter()
            .zip(&by_catalog)
            .map(|(label, total)| json!({ "catalog": label, "total": total }))
            .collect();

        dataset.rows.push(json!({
            "contractor": name,
            "by_catalog": cells,
            "change": change,
            "change_pct": change.map(round_pct),
        }));
    }

    dataset.enforce_limit();
    dataset
}

// ---------------------------------------------------------------------------
// Section tables
// ---------------------------------------------------------------------------

/// `section_totals.v1`: per catalog, section × contractor totals.
fn build_section_totals(sections: &[SectionTotals]) -> DerivedDataset {
    let mut dataset = DerivedDataset::new("section_totals");
    for s in sections {
        for c in &s.contractors {
            dataset.rows.push(json!({
                "catalog": s.catalog_label,
                "section": s.section,
                "contractor": c.contractor,
                "total": c.total,
            }));
        }
    }
    dataset.enforce_limit();
    dataset
}

/// `section_breakdown.v1`: per catalog and section, every line item with each
/// contractor's unit and extended price, in file order.
fn build_section_breakdown(view: &FilteredView<'_>) -> DerivedDataset {
    let mut dataset = DerivedDataset::new("section_breakdown");

    for cv in &view.catalogs {
        let mut lines: Vec<(crate::key::MatchKey, serde_json::Value)> = Vec::new();
        for item in &cv.items {
            let key = item.match_key();
            let bid = json!({
                "contractor": item.contractor,
                "unit_price": item.unit_price,
                "extended_price": item.extended_price,
            });
            match lines.iter_mut().find(|(k, _)| *k == key) {
                Some((_, row)) => {
                    if let Some(bids) = row["bids"].as_array_mut() {
                        bids.push(bid);
                    }
                }
                None => lines.push((
                    key,
                    json!({
                        "catalog": cv.label(),
                        "section": item.section,
                        "description": item.description,
                        "unit": item.unit,
                        "quantity": item.quantity,
                        "bids": [bid],
                    }),
                )),
            }
        }
        dataset.rows.extend(lines.into_iter().map(|(_, row)| row));
    }

    dataset.enforce_limit();
    dataset
}
