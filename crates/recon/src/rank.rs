//! Section totals and contractor ranking.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::delta::mean;
use crate::model::{ContractorRank, MatchedGroup, SectionRanking};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractorTotal {
    pub contractor: String,
    pub total: f64,
    #[serde(skip)]
    pub contractor_key: String,
    /// Earliest row this contractor priced in the section.
    #[serde(skip)]
    pub first_row: usize,
}

/// Extended-price totals of every contractor in one section of one catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTotals {
    pub catalog_index: usize,
    pub catalog_label: String,
    pub section: String,
    #[serde(skip)]
    pub section_key: String,
    #[serde(skip)]
    pub first_row: usize,
    pub contractors: Vec<ContractorTotal>,
}

#[derive(Debug)]
struct SectionAcc {
    label: String,
    section: String,
    first_row: usize,
    contractors: BTreeMap<String, ContractorTotal>,
}

/// Sum extended prices per (catalog, section, contractor).
///
/// Duplicate rows for one (catalog, contractor, key) contribute the mean of
/// their extended prices, so a repeated row never doubles the quantity.
pub fn section_totals<'a>(groups: impl IntoIterator<Item = &'a MatchedGroup>) -> Vec<SectionTotals> {
    let mut acc: BTreeMap<(usize, String), SectionAcc> = BTreeMap::new();

    for group in groups {
        let mut per_pair: BTreeMap<(usize, &str), (Vec<f64>, usize, &str, &str)> = BTreeMap::new();
        for o in &group.observations {
            let entry = per_pair
                .entry((o.catalog_index, o.contractor_key.as_str()))
                .or_insert_with(|| (Vec::new(), o.item.row, o.item.contractor.as_str(), o.catalog_label.as_str()));
            entry.0.push(o.item.extended_price);
            entry.1 = entry.1.min(o.item.row);
        }

        for ((catalog_index, contractor_key), (prices, first_row, contractor, label)) in per_pair {
            let section = acc
                .entry((catalog_index, group.key.section.clone()))
                .or_insert_with(|| SectionAcc {
                    label: label.to_string(),
                    section: group.section.clone(),
                    first_row,
                    contractors: BTreeMap::new(),
                });
            if first_row < section.first_row {
                section.first_row = first_row;
                section.section = group.section.clone();
            }

            let total = section
                .contractors
                .entry(contractor_key.to_string())
                .or_insert_with(|| ContractorTotal {
                    contractor: contractor.to_string(),
                    total: 0.0,
                    contractor_key: contractor_key.to_string(),
                    first_row,
                });
            total.total += mean(&prices);
            if first_row < total.first_row {
                total.first_row = first_row;
                total.contractor = contractor.to_string();
            }
        }
    }

    let mut out: Vec<SectionTotals> = acc
        .into_iter()
        .map(|((catalog_index, section_key), s)| {
            let mut contractors: Vec<ContractorTotal> = s.contractors.into_values().collect();
            contractors.sort_by_key(|c| c.first_row);
            SectionTotals {
                catalog_index,
                catalog_label: s.label,
                section: s.section,
                section_key,
                first_row: s.first_row,
                contractors,
            }
        })
        .collect();
    out.sort_by_key(|s| (s.catalog_index, s.first_row));
    out
}

/// Whole cents; totals are compared at this precision.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Standard competition ranking ("1224"), lowest value = rank 1.
/// Equal values share a rank; the next distinct value skips past the tie.
pub fn competition_ranks(values: &[i64]) -> Vec<usize> {
    values
        .iter()
        .map(|v| 1 + values.iter().filter(|other| *other < v).count())
        .collect()
}

/// Rank the contractors of one section, lowest total first. Tied contractors
/// share a rank and are listed in the order they appear in the file.
pub fn rank_contractors(section: &SectionTotals) -> Vec<ContractorRank> {
    let cents: Vec<i64> = section.contractors.iter().map(|c| to_cents(c.total)).collect();
    let ranks = competition_ranks(&cents);

    let mut ranked: Vec<(usize, i64, &ContractorTotal)> = ranks
        .into_iter()
        .zip(cents)
        .zip(&section.contractors)
        .map(|((rank, cents), c)| (rank, cents, c))
        .collect();
    // Stable: equal cents keep first-appearance order.
    ranked.sort_by_key(|(_, cents, _)| *cents);

    ranked
        .into_iter()
        .map(|(rank, _, c)| ContractorRank {
            contractor: c.contractor.clone(),
            total: c.total,
            rank,
        })
        .collect()
}

pub fn rank_sections<'a>(groups: impl IntoIterator<Item = &'a MatchedGroup>) -> Vec<SectionRanking> {
    section_totals(groups)
        .iter()
        .map(|s| SectionRanking {
            catalog_label: s.catalog_label.clone(),
            section: s.section.clone(),
            ranks: rank_contractors(s),
        })
        .collect()
}
