// bidlens CLI - compare construction bid tabulations across files and years

mod compare;
mod exit_codes;
mod inspect;
mod report;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{bid_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "bidlens")]
#[command(about = "Compare construction bid tabulations across files and years")]
#[command(version)]
struct Cli {
    /// Log engine decisions (duplicates, excluded files, counts) to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare bid files: price changes, rankings, unit price statistics
    #[command(after_help = "\
Examples:
  bidlens compare bids-2023.csv bids-2024.csv
  bidlens compare bids-*.csv --contractor 'Acme Paving' --section Paving
  bidlens compare --config county.bids.toml --json
  bidlens compare bids-2023.csv bids-2024.csv --output report.json")]
    Compare {
        /// Bid CSV files (labels are derived from the file names)
        files: Vec<PathBuf>,

        /// Session config (*.bids.toml) listing files, labels and selection
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Only compare these catalogs (label or file name). Repeatable.
        #[arg(long = "file", value_name = "LABEL")]
        select_files: Vec<String>,

        /// Only compare these contractors. Repeatable.
        #[arg(long, value_name = "NAME")]
        contractor: Vec<String>,

        /// Only compare these sections. Repeatable.
        #[arg(long, value_name = "NAME")]
        section: Vec<String>,

        /// Report line items bid by a single contractor in a single file
        #[arg(long)]
        include_singletons: bool,

        /// Print the full report as JSON instead of text tables
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Normalize one bid file and show its catalog and row diagnostics
    #[command(after_help = "\
Examples:
  bidlens inspect bids-2024.csv
  bidlens inspect bids-2024.csv --json")]
    Inspect {
        file: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a session config without loading any bid file
    Validate {
        config: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<bidlens_recon::BidError> for CliError {
    fn from(err: bidlens_recon::BidError) -> Self {
        Self::new(bid_exit_code(&err), err.to_string())
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare {
            files,
            config,
            select_files,
            contractor,
            section,
            include_singletons,
            json,
            output,
        } => compare::cmd_compare(compare::CompareArgs {
            files,
            config,
            select_files,
            contractors: contractor,
            sections: section,
            include_singletons,
            json,
            output,
        }),
        Commands::Inspect { file, json } => inspect::cmd_inspect(file, json),
        Commands::Validate { config } => compare::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
