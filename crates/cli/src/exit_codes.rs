//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3       | Universal        | File or network I/O failure              |
//! | 10-19   | estimate         | Model load, reconciliation, validation   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use griya_cli::SubmitError;
use griya_recon::ReconError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable labels.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - unreadable input, unwritable output, bind failure.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Estimate (10-19)
// =============================================================================

/// Model artifact missing, unreadable or invalid. The only fatal startup failure.
pub const EXIT_MODEL_LOAD: u8 = 10;

/// Model schema names columns no encoding can supply.
pub const EXIT_SCHEMA_MISMATCH: u8 = 11;

/// Every encoding handed to the model failed.
pub const EXIT_PREDICTION: u8 = 12;

/// Input out of range, or building larger than land under size validation.
pub const EXIT_VALIDATION: u8 = 13;

/// Settings file unreadable or invalid.
pub const EXIT_CONFIG: u8 = 14;

// =============================================================================
// Error mapping
// =============================================================================

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::SchemaMismatch { .. } => EXIT_SCHEMA_MISMATCH,
        ReconError::PredictionFailure { .. } => EXIT_PREDICTION,
    }
}

pub fn submit_exit_code(err: &SubmitError) -> u8 {
    match err {
        SubmitError::Validation(_) => EXIT_VALIDATION,
        SubmitError::Recon(e) => recon_exit_code(e),
    }
}
