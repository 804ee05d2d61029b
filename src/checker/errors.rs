//! Checker errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for checker operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Conditions that stop checking a submission altogether
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error while reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("checking interrupted by cancellation")]
    Cancelled,
}

impl CheckError {
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        CheckError::Io {
            file: file.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CheckError::Cancelled)
    }
}
