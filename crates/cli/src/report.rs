//! Text rendering of a comparison report.

use bidlens_recon::ComparisonReport;

use crate::util::{fmt_money, fmt_pct, render_table};

pub fn render_report(report: &ComparisonReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}: {} catalog(s): {}\n",
        report.meta.session_name,
        report.meta.catalogs.len(),
        report.meta.catalogs.join(", ")
    ));
    for name in &report.derived.missing_contractors {
        out.push_str(&format!("No data for {name}\n"));
    }

    section(&mut out, "Files", &render_files(report));

    let skipped = render_skipped(report);
    if !skipped.is_empty() {
        section(&mut out, "Skipped rows", &skipped);
    }

    if !report.diagnostics.duplicates.is_empty() {
        let rows: Vec<Vec<String>> = report
            .diagnostics
            .duplicates
            .iter()
            .map(|d| {
                let rows: Vec<String> = d.rows.iter().map(|r| r.to_string()).collect();
                vec![d.catalog_label.clone(), d.contractor.clone(), d.key.to_string(), rows.join(", ")]
            })
            .collect();
        section(
            &mut out,
            "Duplicate line items",
            &render_table(&["Catalog", "Contractor", "Item", "Rows"], &[false, false, false, false], &rows),
        );
    }

    let deltas: Vec<Vec<String>> = report
        .comparison
        .price_deltas
        .iter()
        .map(|s| {
            vec![
                s.section.clone(),
                s.description.clone(),
                s.unit.clone(),
                s.contractor.clone(),
                s.overall.from_label.clone(),
                s.overall.to_label.clone(),
                fmt_money(s.overall.from_price),
                fmt_money(s.overall.to_price),
                fmt_pct(s.overall.delta_pct),
            ]
        })
        .collect();
    section(
        &mut out,
        "Unit price changes",
        &render_table(
            &["Section", "Item", "Unit", "Contractor", "From", "To", "From price", "To price", "Change"],
            &[false, false, false, false, false, false, true, true, true],
            &deltas,
        ),
    );

    let mut ranks: Vec<Vec<String>> = Vec::new();
    for r in &report.comparison.rankings {
        for c in &r.ranks {
            ranks.push(vec![
                r.catalog_label.clone(),
                r.section.clone(),
                c.rank.to_string(),
                c.contractor.clone(),
                fmt_money(c.total),
            ]);
        }
    }
    section(
        &mut out,
        "Section rankings",
        &render_table(
            &["Catalog", "Section", "Rank", "Contractor", "Total"],
            &[false, false, true, false, true],
            &ranks,
        ),
    );

    let stats: Vec<Vec<String>> = report
        .comparison
        .unit_price_stats
        .iter()
        .map(|s| {
            vec![
                s.section.clone(),
                s.description.clone(),
                s.unit.clone(),
                s.observations.to_string(),
                fmt_money(s.mean),
                s.std_dev.map(fmt_money).unwrap_or_else(|| "n/a".into()),
                fmt_money(s.min),
                fmt_money(s.max),
            ]
        })
        .collect();
    section(
        &mut out,
        "Unit price statistics",
        &render_table(
            &["Section", "Item", "Unit", "N", "Mean", "Std dev", "Min", "Max"],
            &[false, false, false, true, true, true, true, true],
            &stats,
        ),
    );

    section(&mut out, "Contractor totals", &render_totals(report));
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(body);
}

fn render_files(report: &ComparisonReport) -> String {
    let mut rows: Vec<Vec<String>> = report
        .diagnostics
        .files
        .iter()
        .map(|d| {
            vec![
                d.source_file.clone(),
                d.rows_read.to_string(),
                d.emitted.to_string(),
                d.incomplete.to_string(),
                d.skipped.to_string(),
                String::new(),
            ]
        })
        .collect();
    for e in &report.diagnostics.excluded {
        let counts = match &e.diagnostics {
            Some(d) => [d.rows_read, d.emitted, d.incomplete, d.skipped].map(|n| n.to_string()),
            None => Default::default(),
        };
        let mut row = vec![e.source.clone()];
        row.extend(counts);
        row.push(format!("excluded: {}", e.reason));
        rows.push(row);
    }
    render_table(
        &["File", "Rows", "Items", "Incomplete", "Skipped", "Note"],
        &[false, true, true, true, true, false],
        &rows,
    )
}

/// Every skipped row with its reason, excluded files included.
fn render_skipped(report: &ComparisonReport) -> String {
    let excluded = report.diagnostics.excluded.iter().filter_map(|e| e.diagnostics.as_ref());
    let rows: Vec<Vec<String>> = report
        .diagnostics
        .files
        .iter()
        .chain(excluded)
        .flat_map(|d| {
            d.skipped_rows
                .iter()
                .map(|s| vec![d.source_file.clone(), s.row.to_string(), s.reason.clone()])
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    render_table(&["File", "Row", "Reason"], &[false, true, false], &rows)
}

/// Contractor × catalog totals with the first-to-last change.
fn render_totals(report: &ComparisonReport) -> String {
    let labels = &report.meta.catalogs;
    let mut headers: Vec<&str> = vec!["Contractor"];
    headers.extend(labels.iter().map(|l| l.as_str()));
    headers.push("Change");

    let mut numeric = vec![false];
    numeric.extend(labels.iter().map(|_| true));
    numeric.push(true);

    let rows: Vec<Vec<String>> = report
        .derived
        .yoy_totals
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row["contractor"].as_str().unwrap_or_default().to_string()];
            if let Some(by_catalog) = row["by_catalog"].as_array() {
                cells.extend(
                    by_catalog
                        .iter()
                        .map(|c| c["total"].as_f64().map(fmt_money).unwrap_or_else(|| "-".into())),
                );
            }
            cells.push(fmt_pct(row["change_pct"].as_f64()));
            cells
        })
        .collect();

    render_table(&headers, &numeric, &rows)
}
