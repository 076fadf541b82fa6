use serde::Serialize;

use crate::key::{normalize_text, MatchKey};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One priced row of a bid, in canonical form.
///
/// Text fields are never absent; a missing column yields an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub source_file: String,
    /// 1-based row number in the source file.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_no: Option<String>,
    pub section: String,
    pub contractor: String,
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub extended_price: f64,
    /// Quantity or unit price was absent and defaulted to zero.
    pub incomplete: bool,
}

impl LineItem {
    pub fn match_key(&self) -> MatchKey {
        MatchKey::new(&self.section, &self.description, &self.unit)
    }

    /// Folded contractor name used as contractor identity.
    pub fn contractor_key(&self) -> String {
        normalize_text(&self.contractor)
    }

    pub fn section_key(&self) -> String {
        normalize_text(&self.section)
    }
}

// ---------------------------------------------------------------------------
// Row diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Per-file normalization counters, returned next to the items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowDiagnostics {
    pub source_file: String,
    pub rows_read: usize,
    pub emitted: usize,
    /// Emitted items whose quantity or unit price defaulted to zero.
    pub incomplete: usize,
    /// Rows (or worksheet cells) rejected for a bad numeric value.
    pub skipped: usize,
    pub blank: usize,
    /// Section heading rows carrying no item.
    pub headings: usize,
    /// Subtotal / total rows.
    pub summary_rows: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

impl RowDiagnostics {
    pub fn new(source_file: &str) -> Self {
        Self {
            source_file: source_file.to_string(),
            ..Self::default()
        }
    }

    pub fn has_issues(&self) -> bool {
        self.incomplete > 0 || self.skipped > 0
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// One line item as seen by the matcher, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Position of the contributing catalog in the filtered view.
    pub catalog_index: usize,
    pub catalog_label: String,
    pub contractor_key: String,
    pub item: LineItem,
}

/// Line items across catalogs and contractors sharing one match key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedGroup {
    pub key: MatchKey,
    /// Display labels taken from the earliest observation.
    pub section: String,
    pub description: String,
    pub unit: String,
    pub observations: Vec<Observation>,
}

impl MatchedGroup {
    /// Distinct catalogs contributing to this group.
    pub fn catalog_count(&self) -> usize {
        let mut seen: Vec<usize> = self.observations.iter().map(|o| o.catalog_index).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Distinct (catalog, contractor) pairs contributing to this group.
    pub fn pair_count(&self) -> usize {
        let mut seen: Vec<(usize, &str)> = self
            .observations
            .iter()
            .map(|o| (o.catalog_index, o.contractor_key.as_str()))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Contractor keys in order of first appearance.
    pub fn contractor_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for o in &self.observations {
            if !keys.contains(&o.contractor_key.as_str()) {
                keys.push(&o.contractor_key);
            }
        }
        keys
    }
}

/// A (catalog, contractor) pair listed the same match key more than once.
/// Both rows are kept as separate observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatchWarning {
    pub catalog_label: String,
    pub source_file: String,
    pub contractor: String,
    pub key: MatchKey,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchedGroups {
    /// Labels of the catalogs in the filtered view, in view order.
    pub catalog_labels: Vec<String>,
    pub groups: Vec<MatchedGroup>,
    /// Keys contributed by a single (catalog, contractor) pair. Held back from
    /// `groups` unless singletons were requested, but still ranked.
    pub singletons: Vec<MatchedGroup>,
    pub warnings: Vec<DuplicateMatchWarning>,
}

impl MatchedGroups {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.singletons.is_empty()
    }

    /// Every group, emitted or held back.
    pub fn all_groups(&self) -> impl Iterator<Item = &MatchedGroup> {
        self.groups.iter().chain(self.singletons.iter())
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Price change between two catalogs. `delta` is `None` when the earlier
/// price is zero: a percentage against a zero baseline is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDelta {
    pub from_label: String,
    pub to_label: String,
    pub from_price: f64,
    pub to_price: f64,
    /// `(to - from) / from`, unrounded.
    pub delta: Option<f64>,
    /// `delta` as a percentage rounded to 2 decimals.
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub catalog_label: String,
    /// Mean unit price of this contractor's observations in the catalog.
    pub unit_price: f64,
    pub observations: usize,
}

/// Unit price of one contractor for one match key across catalogs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDeltaSeries {
    pub key: MatchKey,
    pub section: String,
    pub description: String,
    pub unit: String,
    pub contractor: String,
    pub points: Vec<SeriesPoint>,
    /// Consecutive catalog-to-catalog changes.
    pub steps: Vec<PriceDelta>,
    /// First catalog to last catalog.
    pub overall: PriceDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractorRank {
    pub contractor: String,
    pub total: f64,
    pub rank: usize,
}

/// Contractors in one section of one catalog, lowest total first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRanking {
    pub catalog_label: String,
    pub section: String,
    pub ranks: Vec<ContractorRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitPriceStats {
    pub key: MatchKey,
    pub section: String,
    pub description: String,
    pub unit: String,
    pub observations: usize,
    pub mean: f64,
    /// Population variance; undefined for a single observation.
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub price_deltas: Vec<PriceDeltaSeries>,
    pub rankings: Vec<SectionRanking>,
    pub unit_price_stats: Vec<UnitPriceStats>,
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.price_deltas.is_empty() && self.rankings.is_empty() && self.unit_price_stats.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub session_name: String,
    pub engine_version: String,
    pub run_at: String,
    /// Catalog labels in the filtered view.
    pub catalogs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub catalogs: usize,
    pub excluded_files: usize,
    pub line_items: usize,
    pub contractors: usize,
    pub matched_groups: usize,
    pub singletons: usize,
    pub price_series: usize,
    /// Series whose first-to-last change is undefined (zero baseline).
    pub undefined_deltas: usize,
    pub section_rankings: usize,
    pub incomplete_items: usize,
    pub skipped_rows: usize,
    pub duplicate_warnings: usize,
    pub missing_contractors: usize,
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

/// A named, versioned table of JSON rows layered on top of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedDataset {
    pub schema: String,
    pub version: u32,
    pub rows: Vec<serde_json::Value>,
    pub truncated: bool,
}

impl DerivedDataset {
    pub const MAX_ROWS: usize = 10_000;

    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            version: 1,
            rows: Vec::new(),
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn enforce_limit(&mut self) {
        if self.rows.len() > Self::MAX_ROWS {
            self.rows.truncate(Self::MAX_ROWS);
            self.truncated = true;
        }
    }
}
