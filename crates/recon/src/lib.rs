//! `bidlens-recon`: construction bid reconciliation and comparison engine.
//!
//! Loads bid tabulation CSVs into per-file catalogs, aligns line items across
//! files by a normalized match key, and computes price deltas, contractor
//! rankings and unit price statistics. No CLI or terminal output.

pub mod alias;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod delta;
pub mod derived;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod filter;
pub mod key;
pub mod load;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod rank;
pub mod stats;

pub use catalog::{build_catalog, BidCatalog};
pub use compare::compare;
pub use config::SessionConfig;
pub use engine::{ComparisonReport, ExcludedFile, FileSource, Session};
pub use error::BidError;
pub use filter::{filter_catalogs, Selection};
pub use key::MatchKey;
pub use load::{load_file, LoadFailure, LoadedFile};
pub use matcher::{match_catalogs, MatchOptions};
pub use model::{ComparisonResult, LineItem, MatchedGroups, RowDiagnostics};
pub use normalize::normalize;
