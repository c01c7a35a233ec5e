//! Verifier Errors
//!
//! Fatal conditions that abort a verification run. Case-level failures
//! (missing feature, pattern not found) are not errors; they are recorded
//! in [`CaseResult`](crate::driver::CaseResult) and the run continues.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::driver::DriverState;
use crate::lowering::LoweringError;

/// Exit code when every case passed.
pub const EXIT_PASSED: u8 = 0;
/// Exit code when at least one case failed.
pub const EXIT_FAILED: u8 = 1;
/// Exit code for configuration errors and other fatal conditions.
pub const EXIT_CONFIG: u8 = 2;

/// Errors that abort a verification run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid driver state: run() called while {0}")]
    InvalidState(DriverState),

    #[error(transparent)]
    Lowering(#[from] LoweringError),

    #[error("failed to write report")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        EXIT_CONFIG
    }
}

/// Result type for verifier operations.
pub type VerifyResult<T> = Result<T, VerifyError>;
