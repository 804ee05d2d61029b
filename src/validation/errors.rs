//! Validation and executor errors
//!
//! `ValidationFailure` ends a validation without a verdict: system and
//! configuration problems, cancellation and panics. Findings about the data
//! are never failures, they go to the report.

use std::io;

use thiserror::Error;

use crate::checker::CheckError;
use crate::dictionary::DictionaryError;
use crate::planner::PlannerError;
use crate::store::StoreError;

/// Why a validation stopped before producing an outcome
#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("validation cancelled")]
    Cancelled,

    #[error("file store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error while reading {file}: {source}")]
    Read {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("planning failed: {0}")]
    Planner(#[from] PlannerError),

    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("validation panicked: {0}")]
    Panicked(String),
}

impl ValidationFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ValidationFailure::Cancelled)
    }
}

impl From<CheckError> for ValidationFailure {
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::Cancelled => ValidationFailure::Cancelled,
            CheckError::Store(e) => ValidationFailure::Store(e),
            CheckError::Io { file, source } => ValidationFailure::Read { file, source },
        }
    }
}

/// Reasons the executor refuses a validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// Every worker is busy. The executor keeps no backlog.
    #[error("all {limit} validation workers are busy")]
    Rejected { limit: usize },

    #[error("a validation for '{0}' is already running")]
    AlreadyRunning(String),

    #[error("executor is shut down")]
    ShutDown,

    #[error("no tokio runtime available")]
    NoRuntime,
}

impl ExecutorError {
    /// The distinguished "no free worker" rejection
    pub fn is_rejected(&self) -> bool {
        matches!(self, ExecutorError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_cancellation_maps_to_cancelled() {
        let failure: ValidationFailure = CheckError::Cancelled.into();
        assert!(failure.is_cancelled());

        let failure: ValidationFailure =
            CheckError::io("donor.txt", io::Error::new(io::ErrorKind::UnexpectedEof, "eof")).into();
        assert!(failure.to_string().contains("donor.txt"));
    }

    #[test]
    fn test_rejected() {
        assert!(ExecutorError::Rejected { limit: 2 }.is_rejected());
        assert!(!ExecutorError::ShutDown.is_rejected());
    }
}
