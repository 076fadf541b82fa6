//! `bidlens compare` and `bidlens validate`.

use std::path::PathBuf;

use bidlens_recon::{MatchOptions, Selection, Session, SessionConfig};
use log::debug;

use crate::exit_codes::EXIT_NO_USABLE_FILES;
use crate::report::render_report;
use crate::CliError;

pub struct CompareArgs {
    pub files: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub select_files: Vec<String>,
    pub contractors: Vec<String>,
    pub sections: Vec<String>,
    pub include_singletons: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
}

/// Command-line selection lists replace the config's list for the same
/// dimension; an empty flag list keeps the config's.
fn merge_selection(base: Selection, args: &CompareArgs) -> Selection {
    let pick = |flag: &[String], base: Vec<String>| if flag.is_empty() { base } else { flag.to_vec() };
    Selection {
        files: pick(&args.select_files, base.files),
        contractors: pick(&args.contractors, base.contractors),
        sections: pick(&args.sections, base.sections),
    }
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let mut files: Vec<(PathBuf, Option<String>)> = Vec::new();
    let mut selection = Selection::default();
    let mut options = MatchOptions::default();
    let mut name = "bid comparison".to_string();

    if let Some(config_path) = &args.config {
        let config = SessionConfig::from_path(config_path)?;
        debug!("{}: {} files", config_path.display(), config.files.len());
        name = config.display_name().to_string();
        files.extend(
            config
                .resolve_paths(config_path)
                .into_iter()
                .map(|(path, label)| (path, Some(label))),
        );
        selection = config.selection.clone();
        options = config.options.clone();
    }
    files.extend(args.files.iter().map(|p| (p.clone(), None)));

    if files.is_empty() {
        return Err(CliError::usage("no bid files given")
            .with_hint("pass CSV files, or --config with a *.bids.toml session"));
    }

    let selection = merge_selection(selection, &args);
    options.include_singletons |= args.include_singletons;

    let session = Session::open(&name, &files);
    for e in session.excluded() {
        eprintln!("warning: excluded {}: {}", e.source, e.reason);
    }
    if session.is_empty() {
        return Err(CliError::new(EXIT_NO_USABLE_FILES, "no usable bid files")
            .with_hint("each file needs a header row and at least one priced line item"));
    }

    let report = session.compare(&selection, &options);

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = SessionConfig::from_path(&config_path)?;
    println!(
        "{}: valid ({} file(s): {})",
        config.display_name(),
        config.files.len(),
        config.files.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ")
    );
    Ok(())
}
