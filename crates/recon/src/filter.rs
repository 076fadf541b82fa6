//! Selection scoping applied before matching.
//!
//! Filtering borrows from the catalogs and never copies or mutates them.

use serde::{Deserialize, Serialize};

use crate::catalog::BidCatalog;
use crate::key::normalize_text;
use crate::model::LineItem;

/// User scoping. An empty list means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Selection {
    /// Catalog labels or source file names.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub contractors: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    fn wants_file(&self, catalog: &BidCatalog) -> bool {
        if self.files.is_empty() {
            return true;
        }
        let file_name = std::path::Path::new(catalog.source_file())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_else(|| catalog.source_file());
        self.files
            .iter()
            .any(|f| f == catalog.label() || f == catalog.source_file() || f == file_name)
    }
}

/// Read-only view of one catalog restricted to the selected items.
#[derive(Debug, Clone)]
pub struct CatalogView<'a> {
    pub catalog: &'a BidCatalog,
    pub items: Vec<&'a LineItem>,
}

impl<'a> CatalogView<'a> {
    pub fn label(&self) -> &'a str {
        self.catalog.label()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub catalogs: Vec<CatalogView<'a>>,
    /// Selected contractors with no items anywhere in the view.
    pub missing_contractors: Vec<String>,
}

impl<'a> FilteredView<'a> {
    pub fn is_empty(&self) -> bool {
        self.catalogs.iter().all(|c| c.items.is_empty())
    }

    pub fn item_count(&self) -> usize {
        self.catalogs.iter().map(|c| c.items.len()).sum()
    }
}

/// Restrict catalogs to a selection. Catalog order is preserved; a catalog
/// left with no items stays in the view so its label still shows.
pub fn filter_catalogs<'a>(catalogs: &'a [BidCatalog], selection: &Selection) -> FilteredView<'a> {
    let contractor_keys: Vec<String> = selection.contractors.iter().map(|c| normalize_text(c)).collect();
    let section_keys: Vec<String> = selection.sections.iter().map(|s| normalize_text(s)).collect();

    let views: Vec<CatalogView<'a>> = catalogs
        .iter()
        .filter(|c| selection.wants_file(c))
        .map(|catalog| {
            let items = catalog
                .items()
                .iter()
                .filter(|item| contractor_keys.is_empty() || contractor_keys.contains(&item.contractor_key()))
                .filter(|item| section_keys.is_empty() || section_keys.contains(&item.section_key()))
                .collect();
            CatalogView { catalog, items }
        })
        .collect();

    let missing_contractors = selection
        .contractors
        .iter()
        .zip(&contractor_keys)
        .filter(|(_, key)| {
            !views
                .iter()
                .any(|v| v.items.iter().any(|item| item.contractor_key() == **key))
        })
        .map(|(name, _)| name.clone())
        .collect();

    FilteredView {
        catalogs: views,
        missing_contractors,
    }
}
