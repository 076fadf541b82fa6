use crate::delta::delta_series;
use crate::model::{ComparisonResult, MatchedGroups};
use crate::rank::rank_sections;
use crate::stats::unit_price_stats;

/// Compute the comparison tables for a set of matched groups.
///
/// - deltas: emitted groups only; a contractor needs two catalogs for a series
/// - rankings: every group, singletons included, per section per catalog
/// - unit price statistics: emitted groups only
pub fn compare(matched: &MatchedGroups) -> ComparisonResult {
    ComparisonResult {
        price_deltas: matched.groups.iter().flat_map(delta_series).collect(),
        rankings: rank_sections(matched.all_groups()),
        unit_price_stats: matched.groups.iter().map(unit_price_stats).collect(),
    }
}
