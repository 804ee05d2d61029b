//! Observable events
//!
//! Every log line emitted by dictgate carries one of these names in its
//! `event` field. Events are explicit and typed.

use std::fmt;

/// Observable events during a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Dictionary and code lists loaded and validated
    DictionaryLoaded,

    // Planning
    /// Plan compiled for a project
    PlanBuilt,

    // Validation lifecycle
    /// Validation accepted by the executor
    ValidationSubmitted,
    /// Validation rejected, no worker free
    ValidationRejected,
    /// Worker picked up the validation
    ValidationStarted,
    /// Validation finished normally
    ValidationCompleted,
    /// Validation observed its cancellation flag
    ValidationCancelled,
    /// Validation aborted with a system error
    ValidationFailed,

    // Validators and files
    /// Validator begins
    ValidatorBegin,
    /// Validator skipped because earlier validators reported errors
    ValidatorSkipped,
    /// File-level checks on one file
    FileCheck,
    /// Periodic row scan progress
    RowScanProgress,
    /// Per-file report written
    ReportWritten,

    // Executor
    /// Executor stopped, in-flight jobs interrupted
    ExecutorShutdown,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DictionaryLoaded => "DICTIONARY_LOADED",

            Event::PlanBuilt => "PLAN_BUILT",

            Event::ValidationSubmitted => "VALIDATION_SUBMITTED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::ValidationStarted => "VALIDATION_STARTED",
            Event::ValidationCompleted => "VALIDATION_COMPLETED",
            Event::ValidationCancelled => "VALIDATION_CANCELLED",
            Event::ValidationFailed => "VALIDATION_FAILED",

            Event::ValidatorBegin => "VALIDATOR_BEGIN",
            Event::ValidatorSkipped => "VALIDATOR_SKIPPED",
            Event::FileCheck => "FILE_CHECK",
            Event::RowScanProgress => "ROW_SCAN_PROGRESS",
            Event::ReportWritten => "REPORT_WRITTEN",

            Event::ExecutorShutdown => "EXECUTOR_SHUTDOWN",
        }
    }

    /// Returns true if this event ends a validation abnormally
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::ValidationFailed | Event::ValidationRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::DictionaryLoaded,
            Event::PlanBuilt,
            Event::ValidationSubmitted,
            Event::ValidationRejected,
            Event::ValidationStarted,
            Event::ValidationCompleted,
            Event::ValidationCancelled,
            Event::ValidationFailed,
            Event::ValidatorBegin,
            Event::ValidatorSkipped,
            Event::FileCheck,
            Event::RowScanProgress,
            Event::ReportWritten,
            Event::ExecutorShutdown,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::ValidationFailed.is_failure());
        assert!(!Event::ValidationCancelled.is_failure());
        assert!(!Event::ValidationCompleted.is_failure());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::PlanBuilt), "PLAN_BUILT");
    }
}
