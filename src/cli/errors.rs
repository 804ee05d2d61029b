//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::dictionary::DictionaryError;
use crate::planner::PlannerError;
use crate::validation::{ExecutorError, ValidationFailure};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error
    IoError,
    /// Dictionary or code lists unusable
    DictionaryError,
    /// Plan rejected
    PlanError,
    /// Executor refused or could not start
    ExecutorError,
    /// At least one submission is invalid or failed to validate
    SubmissionInvalid,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DICTGATE_CLI_CONFIG_ERROR",
            Self::IoError => "DICTGATE_CLI_IO_ERROR",
            Self::DictionaryError => "DICTGATE_CLI_DICTIONARY_ERROR",
            Self::PlanError => "DICTGATE_CLI_PLAN_ERROR",
            Self::ExecutorError => "DICTGATE_CLI_EXECUTOR_ERROR",
            Self::SubmissionInvalid => "DICTGATE_CLI_SUBMISSION_INVALID",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn submission_invalid(invalid: usize, total: usize) -> Self {
        Self::new(
            CliErrorCode::SubmissionInvalid,
            format!("{} of {} submission(s) did not pass validation", invalid, total),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<DictionaryError> for CliError {
    fn from(e: DictionaryError) -> Self {
        Self::new(CliErrorCode::DictionaryError, e.to_string())
    }
}

impl From<PlannerError> for CliError {
    fn from(e: PlannerError) -> Self {
        Self::new(CliErrorCode::PlanError, e.to_string())
    }
}

impl From<ExecutorError> for CliError {
    fn from(e: ExecutorError) -> Self {
        Self::new(CliErrorCode::ExecutorError, e.to_string())
    }
}

impl From<ValidationFailure> for CliError {
    fn from(e: ValidationFailure) -> Self {
        Self::io_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::submission_invalid(1, 3);
        assert_eq!(
            err.to_string(),
            "DICTGATE_CLI_SUBMISSION_INVALID: 1 of 3 submission(s) did not pass validation"
        );
        assert_eq!(err.code(), &CliErrorCode::SubmissionInvalid);
    }

    #[test]
    fn test_rejected_executor_maps_to_executor_code() {
        let err: CliError = ExecutorError::Rejected { limit: 2 }.into();
        assert_eq!(err.code_str(), "DICTGATE_CLI_EXECUTOR_ERROR");
    }
}
