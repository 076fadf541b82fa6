//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, no input files)           |
//! | 3    | No usable bid files (every file excluded)            |
//! | 4    | Session config invalid (parse or validation failure) |
//! | 5    | I/O error (unreadable config, unwritable output)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `bid_exit_code` or the relevant command

use bidlens_recon::BidError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required inputs.
pub const EXIT_USAGE: u8 = 2;

/// No bid file produced a usable catalog.
pub const EXIT_NO_USABLE_FILES: u8 = 3;

/// Session config failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 4;

/// File read or write failed.
pub const EXIT_IO: u8 = 5;

/// Map an engine error to its exit code.
pub fn bid_exit_code(err: &BidError) -> u8 {
    match err {
        BidError::EmptyFile { .. } | BidError::EmptyCatalog { .. } | BidError::MissingHeader { .. } => {
            EXIT_NO_USABLE_FILES
        }
        BidError::ConfigParse(_) | BidError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        BidError::Io(_) => EXIT_IO,
        BidError::Csv { .. } => EXIT_ERROR,
    }
}
