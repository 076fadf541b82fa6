use crate::filter::FilteredView;
use crate::model::{ComparisonResult, ComparisonSummary, MatchedGroups, RowDiagnostics};

/// Compute summary counts for one comparison run.
pub fn compute_summary(
    view: &FilteredView<'_>,
    matched: &MatchedGroups,
    result: &ComparisonResult,
    diagnostics: &[RowDiagnostics],
    excluded_files: usize,
) -> ComparisonSummary {
    let mut contractors: Vec<String> = Vec::new();
    for cv in &view.catalogs {
        for item in &cv.items {
            let key = item.contractor_key();
            if !contractors.contains(&key) {
                contractors.push(key);
            }
        }
    }

    ComparisonSummary {
        catalogs: view.catalogs.len(),
        excluded_files,
        line_items: view.item_count(),
        contractors: contractors.len(),
        matched_groups: matched.groups.len(),
        singletons: matched.singletons.len(),
        price_series: result.price_deltas.len(),
        undefined_deltas: result
            .price_deltas
            .iter()
            .filter(|s| s.overall.delta.is_none())
            .count(),
        section_rankings: result.rankings.len(),
        incomplete_items: view
            .catalogs
            .iter()
            .flat_map(|cv| cv.items.iter())
            .filter(|item| item.incomplete)
            .count(),
        skipped_rows: diagnostics.iter().map(|d| d.skipped).sum(),
        duplicate_warnings: matched.warnings.len(),
        missing_contractors: view.missing_contractors.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use crate::compare::compare;
    use crate::filter::{filter_catalogs, Selection};
    use crate::matcher::{match_catalogs, MatchOptions};
    use crate::model::LineItem;

    fn item(file: &str, contractor: &str, price: f64, incomplete: bool) -> LineItem {
        LineItem {
            source_file: file.into(),
            row: 2,
            line_no: None,
            section: "Paving".into(),
            contractor: contractor.into(),
            description: "Asphalt".into(),
            unit: "SY".into(),
            quantity: 1.0,
            unit_price: price,
            extended_price: price,
            incomplete,
        }
    }

    #[test]
    fn summary_counts() {
        let cats = vec![
            build_catalog(vec![item("a.csv", "Acme", 0.0, true), item("a.csv", "Beta", 9.0, false)], "2023")
                .unwrap(),
            build_catalog(vec![item("b.csv", "acme", 12.0, false)], "2024").unwrap(),
        ];
        let sel = Selection { contractors: vec!["Acme".into(), "Zed".into()], ..Selection::default() };
        let view = filter_catalogs(&cats, &sel);
        let matched = match_catalogs(&view, &MatchOptions::default());
        let result = compare(&matched);
        let diag = RowDiagnostics { skipped: 3, ..RowDiagnostics::new("a.csv") };

        let summary = compute_summary(&view, &matched, &result, &[diag], 1);
        assert_eq!(summary.catalogs, 2);
        assert_eq!(summary.excluded_files, 1);
        assert_eq!(summary.line_items, 2);
        assert_eq!(summary.contractors, 1);
        assert_eq!(summary.matched_groups, 1);
        assert_eq!(summary.price_series, 1);
        assert_eq!(summary.undefined_deltas, 1);
        assert_eq!(summary.incomplete_items, 1);
        assert_eq!(summary.skipped_rows, 3);
        assert_eq!(summary.missing_contractors, 1);
    }
}
