// Integration tests for `bidlens compare`, `bidlens inspect` and `bidlens validate`.
// Run with: cargo test -p bidlens-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::Command;

fn bidlens() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bidlens"));
    cmd.env_remove("RUST_LOG");
    cmd
}

const Y2023: &str = "\
Section,Contractor,Description,Unit,Quantity,Unit Price
Paving,Acme Paving,\"Asphalt, 2in\",SY,2000,20.00
Paving,Beta Construction,\"Asphalt, 2in\",SY,2000,25.00
Paving,Gamma Sitework,\"Asphalt, 2in\",SY,2000,30.00
";

const Y2024: &str = "\
Section,Contractor,Description,Unit,Quantity,Unit Price
Paving,ACME PAVING,asphalt 2in,SY,2000,24.00
Paving,Beta Construction,asphalt 2in,SY,2000,0
";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn two_files(dir: &Path) -> (PathBuf, PathBuf) {
    (write(dir, "bids-2023.csv", Y2023), write(dir, "bids-2024.csv", Y2024))
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("valid JSON on stdout")
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

#[test]
fn compare_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_files(dir.path());

    let output = bidlens()
        .args(["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--json"])
        .output()
        .expect("bidlens compare --json");
    assert!(output.status.success(), "exit code was {:?}", output.status);

    let json = stdout_json(&output);
    assert_eq!(json["meta"]["catalogs"], serde_json::json!(["2023", "2024"]));

    let deltas = json["comparison"]["price_deltas"].as_array().unwrap();
    assert_eq!(deltas.len(), 2);
    let acme = deltas.iter().find(|s| s["contractor"] == "Acme Paving").unwrap();
    assert_eq!(acme["overall"]["delta_pct"], 20.0);

    let beta = deltas.iter().find(|s| s["contractor"] == "Beta Construction").unwrap();
    assert_eq!(beta["overall"]["delta_pct"], -100.0);
}

#[test]
fn compare_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_files(dir.path());

    let output = bidlens()
        .args(["compare", a.to_str().unwrap(), b.to_str().unwrap()])
        .output()
        .expect("bidlens compare");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unit price changes"));
    assert!(stdout.contains("+20.00%"));
    assert!(stdout.contains("Section rankings"));
    assert!(stdout.contains("Unit price statistics"));
    assert!(stdout.contains("Contractor totals"));
}

#[test]
fn compare_contractor_filter() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_files(dir.path());

    let output = bidlens()
        .args(["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--json"])
        .args(["--contractor", "acme paving", "--contractor", "Nobody"])
        .output()
        .expect("bidlens compare --contractor");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["comparison"]["price_deltas"].as_array().unwrap().len(), 1);
    assert_eq!(json["derived"]["missing_contractors"], serde_json::json!(["Nobody"]));
}

#[test]
fn compare_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_files(dir.path());
    let out = dir.path().join("report.json");

    let output = bidlens()
        .args(["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--output", out.to_str().unwrap()])
        .output()
        .expect("bidlens compare --output");
    assert!(output.status.success());

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["summary"]["catalogs"], 2);
}

#[test]
fn compare_excludes_bad_file_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_files(dir.path());
    let bad = write(dir.path(), "notes.csv", "just,some,text\n");

    let output = bidlens()
        .args(["compare", a.to_str().unwrap(), b.to_str().unwrap(), bad.to_str().unwrap(), "--json"])
        .output()
        .expect("bidlens compare with bad file");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("excluded"), "stderr: {stderr}");
    assert_eq!(stdout_json(&output)["summary"]["excluded_files"], 1);
}

#[test]
fn compare_no_usable_files_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "empty.csv", "");

    let output = bidlens()
        .args(["compare", bad.to_str().unwrap()])
        .output()
        .expect("bidlens compare empty");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn compare_without_files_is_usage_error() {
    let output = bidlens().args(["compare"]).output().expect("bidlens compare");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no bid files"));
}

#[test]
fn compare_from_config() {
    let dir = tempfile::tempdir().unwrap();
    two_files(dir.path());
    let config = write(
        dir.path(),
        "paving.bids.toml",
        "name = \"Paving\"\n\n[[files]]\npath = \"bids-2023.csv\"\n\n[[files]]\npath = \"bids-2024.csv\"\n\n\
         [selection]\ncontractors = [\"Beta Construction\"]\n",
    );

    let output = bidlens()
        .args(["compare", "--config", config.to_str().unwrap(), "--json"])
        .output()
        .expect("bidlens compare --config");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["meta"]["session_name"], "Paving");
    let deltas = json["comparison"]["price_deltas"].as_array().unwrap();
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0]["contractor"], "Beta Construction");

    // A --contractor flag replaces the config's contractor list.
    let output = bidlens()
        .args(["compare", "--config", config.to_str().unwrap(), "--json", "--contractor", "Acme Paving"])
        .output()
        .expect("bidlens compare --config --contractor");
    let json = stdout_json(&output);
    assert_eq!(json["comparison"]["price_deltas"][0]["contractor"], "Acme Paving");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "ok.bids.toml", "[[files]]\npath = \"bids-2023.csv\"\n");

    let output = bidlens().args(["validate", config.to_str().unwrap()]).output().expect("validate");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("valid"));
}

#[test]
fn validate_rejects_duplicate_labels() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "dup.bids.toml",
        "[[files]]\npath = \"a/bids-2023.csv\"\n\n[[files]]\npath = \"b/bids-2023.csv\"\n",
    );

    let output = bidlens().args(["validate", config.to_str().unwrap()]).output().expect("validate");
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate label"));
}

#[test]
fn validate_missing_config_is_io_error() {
    let output = bidlens()
        .args(["validate", "/nonexistent/session.bids.toml"])
        .output()
        .expect("validate");
    assert_eq!(output.status.code(), Some(5));
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_json() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _) = two_files(dir.path());

    let output = bidlens()
        .args(["inspect", a.to_str().unwrap(), "--json"])
        .output()
        .expect("bidlens inspect --json");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["catalog"]["label"], "2023");
    assert_eq!(json["catalog"]["roster"].as_array().unwrap().len(), 3);
    assert_eq!(json["diagnostics"]["emitted"], 3);
}

#[test]
fn inspect_text() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _) = two_files(dir.path());

    let output = bidlens().args(["inspect", a.to_str().unwrap()]).output().expect("bidlens inspect");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("label:    2023"));
    assert!(stdout.contains("Gamma Sitework"));
    assert!(stdout.contains("$60,000.00"));
}

#[test]
fn inspect_unpriced_file_lists_skip_reasons() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "bids-2025.csv",
        "Section,Contractor,Description,Unit,Quantity,Unit Price\n\
         Paving,Acme Paving,Asphalt,SY,2000,N/A\n\
         Paving,Beta Construction,Asphalt,SY,2000,TBD\n",
    );

    let output = bidlens().args(["inspect", path.to_str().unwrap()]).output().expect("bidlens inspect");
    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("skipped 2"), "stdout: {stdout}");
    assert!(stdout.contains("row 2:") && stdout.contains("N/A"), "stdout: {stdout}");
    assert!(stdout.contains("row 3:") && stdout.contains("TBD"), "stdout: {stdout}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("no usable line items"));

    let output = bidlens()
        .args(["inspect", path.to_str().unwrap(), "--json"])
        .output()
        .expect("bidlens inspect --json");
    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["diagnostics"]["skipped"], 2);
    assert_eq!(json["diagnostics"]["skipped_rows"][1]["row"], 3);
}
