//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success (mismatches found and handled count as this)  |
//! | 2    | Usage error (bad args, unreadable or invalid config)  |
//! | 3    | I/O error (report, document directories)              |
//! | 6    | Store error (open, query, update, commit)             |
//!
//! 1 and 4-5 are unused and kept free.

use docrecon_recon::ReconError;

/// Success. An audit that corrected or flagged records still succeeded.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error: bad arguments or a config that cannot be read or validated.
pub const EXIT_USAGE: u8 = 2;

/// Report or directory I/O failed.
pub const EXIT_IO: u8 = 3;

/// The request store could not be opened, read, written or committed.
pub const EXIT_STORE: u8 = 6;

pub fn exit_code_for(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_USAGE,
        ReconError::Io(_) | ReconError::ReportParse { .. } => EXIT_IO,
        ReconError::Store(_) => EXIT_STORE,
    }
}
