//! `bidlens inspect`: show how one file normalizes.

use std::path::PathBuf;

use bidlens_recon::load::{load_file, LoadFailure};
use bidlens_recon::RowDiagnostics;

use crate::util::{fmt_money, render_table};
use crate::CliError;

pub fn cmd_inspect(path: PathBuf, json: bool) -> Result<(), CliError> {
    let loaded = match load_file(&path, None) {
        Ok(loaded) => loaded,
        Err(failure) => return Err(report_failure(failure, json)),
    };
    let catalog = &loaded.catalog;
    let diag = &loaded.diagnostics;

    if json {
        let value = serde_json::json!({
            "catalog": catalog,
            "diagnostics": diag,
        });
        let out = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("file:     {}", catalog.source_file());
    println!("label:    {}", catalog.label());
    if let Some(project) = catalog.project_name() {
        println!("project:  {project}");
    }
    println!("bidders:  {}", catalog.roster().join(", "));
    println!();

    let mut rows = Vec::new();
    for section in catalog.sections() {
        for group in &section.contractors {
            let total: f64 = group.items.iter().map(|&i| catalog.items()[i].extended_price).sum();
            rows.push(vec![
                section.section.clone(),
                group.contractor.clone(),
                group.items.len().to_string(),
                fmt_money(total),
            ]);
        }
    }
    print!(
        "{}",
        render_table(&["Section", "Contractor", "Items", "Total"], &[false, false, true, true], &rows)
    );

    println!();
    print_diagnostics(diag);

    Ok(())
}

/// A file that read but produced no items still shows its row outcomes, so
/// the user can see why every row was skipped.
fn report_failure(failure: LoadFailure, json: bool) -> CliError {
    let err = CliError::from(failure.error);
    let Some(diag) = failure.diagnostics else {
        return err;
    };

    if json {
        let value = serde_json::json!({
            "error": err.message,
            "diagnostics": diag,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(out) => println!("{out}"),
            Err(e) => return CliError::general(format!("JSON serialization error: {e}")),
        }
    } else {
        println!("file:     {}", diag.source_file);
        println!();
        print_diagnostics(&diag);
    }

    if diag.skipped > 0 {
        err.with_hint("every data row was skipped; fix the values listed above")
    } else {
        err
    }
}

fn print_diagnostics(diag: &RowDiagnostics) {
    println!(
        "rows read {}, items {}, incomplete {}, skipped {}, blank {}, headings {}, totals {}",
        diag.rows_read, diag.emitted, diag.incomplete, diag.skipped, diag.blank, diag.headings, diag.summary_rows
    );
    for s in &diag.skipped_rows {
        println!("  row {}: {}", s.row, s.reason);
    }
}
