use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::catalog::BidCatalog;
use crate::compare::compare;
use crate::config::SessionConfig;
use crate::derived::{build_derived, DerivedTables};
use crate::evidence::compute_summary;
use crate::filter::{filter_catalogs, Selection};
use crate::load::{file_label, load_bytes};
use crate::matcher::{match_catalogs, MatchOptions};
use crate::model::{ComparisonResult, ComparisonSummary, DuplicateMatchWarning, ReportMeta, RowDiagnostics};

/// Raw bytes of one bid file plus the label it will be compared under.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub source: String,
    pub label: String,
    pub bytes: Vec<u8>,
}

impl FileSource {
    pub fn new(source: impl Into<String>, label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
            bytes,
        }
    }
}

/// A file left out of the session, and why. `diagnostics` is present when
/// the file's rows were read, e.g. every row was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedFile {
    pub source: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<RowDiagnostics>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Catalogs built once per load. Comparisons borrow them and never mutate.
#[derive(Debug, Clone, Default)]
pub struct Session {
    name: String,
    catalogs: Vec<BidCatalog>,
    diagnostics: Vec<RowDiagnostics>,
    excluded: Vec<ExcludedFile>,
}

impl Session {
    /// Normalize and catalog every source. A file that fails is excluded and
    /// the rest still load. Catalogs are kept sorted by label.
    pub fn load(name: &str, sources: impl IntoIterator<Item = FileSource>) -> Self {
        let mut loaded: Vec<(BidCatalog, RowDiagnostics)> = Vec::new();
        let mut excluded = Vec::new();

        for src in sources {
            let label = unique_label(&src.label, loaded.iter().map(|(c, _)| c.label()));
            if label != src.label {
                warn!("{}: label '{}' already in use, loaded as '{label}'", src.source, src.label);
            }
            match load_bytes(&src.source, &label, &src.bytes) {
                Ok(file) => {
                    debug!(
                        "{}: loaded as '{label}', {} items from {} contractors",
                        src.source,
                        file.catalog.items().len(),
                        file.catalog.roster().len()
                    );
                    loaded.push((file.catalog, file.diagnostics));
                }
                Err(e) => {
                    warn!("excluding {}: {e}", src.source);
                    excluded.push(ExcludedFile {
                        source: src.source,
                        reason: e.error.to_string(),
                        diagnostics: e.diagnostics,
                    });
                }
            }
        }

        loaded.sort_by(|(a, _), (b, _)| a.label().cmp(b.label()));
        let (catalogs, diagnostics) = loaded.into_iter().unzip();

        let session = Self {
            name: name.to_string(),
            catalogs,
            diagnostics,
            excluded,
        };
        info!(
            "session '{}': {} catalogs loaded, {} excluded",
            session.name,
            session.catalogs.len(),
            session.excluded.len()
        );
        session
    }

    /// Read files from disk. Unreadable files are excluded like any other
    /// failing file. `None` labels are derived from the file name.
    pub fn open(name: &str, files: &[(PathBuf, Option<String>)]) -> Self {
        let mut sources = Vec::new();
        let mut unreadable = Vec::new();

        for (path, label) in files {
            let source = path.display().to_string();
            let label = label.clone().unwrap_or_else(|| file_label(path));
            match std::fs::read(path) {
                Ok(bytes) => sources.push(FileSource::new(source, label, bytes)),
                Err(e) => {
                    warn!("excluding {source}: {e}");
                    unreadable.push(ExcludedFile {
                        source,
                        reason: format!("IO error: {e}"),
                        diagnostics: None,
                    });
                }
            }
        }

        let mut session = Self::load(name, sources);
        unreadable.append(&mut session.excluded);
        session.excluded = unreadable;
        session
    }

    /// Open every file a session config lists, paths relative to the config.
    pub fn from_config(config: &SessionConfig, config_path: &Path) -> Self {
        let files: Vec<(PathBuf, Option<String>)> = config
            .resolve_paths(config_path)
            .into_iter()
            .map(|(path, label)| (path, Some(label)))
            .collect();
        Self::open(config.display_name(), &files)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalogs(&self) -> &[BidCatalog] {
        &self.catalogs
    }

    /// Row diagnostics, one per loaded catalog, in catalog order.
    pub fn diagnostics(&self) -> &[RowDiagnostics] {
        &self.diagnostics
    }

    pub fn excluded(&self) -> &[ExcludedFile] {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Filter → match → compare, plus the derived tables.
    pub fn compare(&self, selection: &Selection, options: &MatchOptions) -> ComparisonReport {
        let view = filter_catalogs(&self.catalogs, selection);
        for name in &view.missing_contractors {
            warn!("no data for contractor '{name}' in the selected files");
        }

        let matched = match_catalogs(&view, options);
        let comparison = compare(&matched);
        let derived = build_derived(&view, &matched);

        let diagnostics: Vec<RowDiagnostics> = self
            .catalogs
            .iter()
            .zip(&self.diagnostics)
            .filter(|(c, _)| view.catalogs.iter().any(|v| std::ptr::eq(v.catalog, *c)))
            .map(|(_, d)| d.clone())
            .collect();

        let summary = compute_summary(&view, &matched, &comparison, &diagnostics, self.excluded.len());
        info!(
            "compared {} catalogs: {} groups, {} price series, {} section rankings",
            summary.catalogs, summary.matched_groups, summary.price_series, summary.section_rankings
        );

        ComparisonReport {
            meta: ReportMeta {
                session_name: self.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                catalogs: matched.catalog_labels.clone(),
            },
            summary,
            diagnostics: ReportDiagnostics {
                files: diagnostics,
                excluded: self.excluded.clone(),
                duplicates: matched.warnings,
            },
            comparison,
            derived,
        }
    }
}

/// `label`, or `label (2)`, `label (3)`, … when already taken.
fn unique_label<'a>(label: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    if !taken.clone().any(|t| t == label) {
        return label.to_string();
    }
    (2..)
        .map(|n| format!("{label} ({n})"))
        .find(|candidate| !taken.clone().any(|t| t == candidate.as_str()))
        .unwrap_or_else(|| label.to_string())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDiagnostics {
    pub files: Vec<RowDiagnostics>,
    pub excluded: Vec<ExcludedFile>,
    pub duplicates: Vec<DuplicateMatchWarning>,
}

/// Everything one comparison run produces. Recomputed from the catalogs on
/// every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub meta: ReportMeta,
    pub summary: ComparisonSummary,
    pub diagnostics: ReportDiagnostics,
    pub comparison: ComparisonResult,
    pub derived: DerivedTables,
}
