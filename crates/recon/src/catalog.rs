//! Per-file bid catalog: items grouped by section, then contractor.

use serde::Serialize;

use crate::error::BidError;
use crate::key::normalize_text;
use crate::model::LineItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractorGroup {
    pub contractor: String,
    /// Indices into the catalog's items, in input order.
    pub items: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionGroup {
    /// Section label as first seen in the file.
    pub section: String,
    pub contractors: Vec<ContractorGroup>,
}

/// All line items of one bid file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidCatalog {
    label: String,
    source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<String>,
    items: Vec<LineItem>,
    sections: Vec<SectionGroup>,
    roster: Vec<String>,
}

impl BidCatalog {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn sections(&self) -> &[SectionGroup] {
        &self.sections
    }

    /// Distinct contractors in order of first appearance.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Section labels in order of first appearance.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.section.as_str()).collect()
    }

    /// Attach the project name read from the file preamble.
    pub fn with_project_name(mut self, name: Option<String>) -> Self {
        self.project_name = name.filter(|n| !n.is_empty());
        self
    }
}

/// Build an immutable catalog from one file's normalized items.
///
/// Fails with [`BidError::EmptyCatalog`] when there is nothing to catalog:
/// an empty catalog would have no contractors to rank or average over.
pub fn build_catalog(items: Vec<LineItem>, label: &str) -> Result<BidCatalog, BidError> {
    let Some(first) = items.first() else {
        return Err(BidError::EmptyCatalog { label: label.to_string() });
    };
    let source_file = first.source_file.clone();

    let mut sections: Vec<SectionGroup> = Vec::new();
    let mut section_keys: Vec<String> = Vec::new();
    let mut contractor_keys: Vec<Vec<String>> = Vec::new();
    let mut roster: Vec<String> = Vec::new();
    let mut roster_keys: Vec<String> = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let section_key = normalize_text(&item.section);
        let contractor_key = normalize_text(&item.contractor);

        let si = match section_keys.iter().position(|k| *k == section_key) {
            Some(si) => si,
            None => {
                section_keys.push(section_key);
                contractor_keys.push(Vec::new());
                sections.push(SectionGroup {
                    section: item.section.clone(),
                    contractors: Vec::new(),
                });
                sections.len() - 1
            }
        };

        let keys = &mut contractor_keys[si];
        let ci = match keys.iter().position(|k| *k == contractor_key) {
            Some(ci) => ci,
            None => {
                keys.push(contractor_key.clone());
                sections[si].contractors.push(ContractorGroup {
                    contractor: item.contractor.clone(),
                    items: Vec::new(),
                });
                keys.len() - 1
            }
        };
        sections[si].contractors[ci].items.push(idx);

        if !roster_keys.contains(&contractor_key) {
            roster_keys.push(contractor_key);
            roster.push(item.contractor.clone());
        }
    }

    Ok(BidCatalog {
        label: label.to_string(),
        source_file,
        project_name: None,
        items,
        sections,
        roster,
    })
}
