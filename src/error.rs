//! Process exit codes.

/// Exit codes for the boardsync application.
///
/// - 0: Success (run fully completed its document set)
/// - 1: General error (the run stopped at the first failure)
/// - 2: Credentials rejected by the remote service (nothing was scanned)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Run fully completed.
    Success = 0,
    /// The run stopped at the first failure.
    GeneralError = 1,
    /// The remote service rejected the configured credentials.
    InvalidCredentials = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
