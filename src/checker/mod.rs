//! File and row checkers
//!
//! Structural checks of the first pass. Each planned file moves through
//! `NotChecked -> FileLevelChecking -> (RowLevelChecking | Aborted) -> Done`.
//! File checkers run as one chain per file, row checkers as one chain per
//! file whose error counts carry over from row to row.

mod chain;
mod errors;
mod file;
mod row;
mod runner;
mod scanner;
mod state;

pub use chain::{Checker, CheckerChain};
pub use errors::{CheckError, CheckResult};
pub use file::{
    file_checkers, CompressionChecker, FileChecker, FileCollisionChecker, FileTarget, HeaderChecker,
    ReferenceChecker,
};
pub use row::{row_checkers, CharsetChecker, ColumnCountChecker, ForbiddenValueChecker, RowChecker, RowTarget};
pub use runner::{FileCheckOutcome, FileCheckRunner};
pub use scanner::{RowScanner, ScannedLine, CANCELLATION_POLL_INTERVAL, PROGRESS_LOG_INTERVAL};
pub use state::FileCheckState;
