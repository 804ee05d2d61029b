//! # Submission store errors

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reading submission files. These are system errors: they abort
/// the validation instead of being reported against the data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Submission directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("I/O error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn io(name: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            name: name.into(),
            source,
        }
    }
}
