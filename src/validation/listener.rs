//! Validation listeners
//!
//! The executor calls `on_started` on the worker before the validation runs,
//! then exactly one of the three terminal callbacks.

use super::errors::ValidationFailure;
use super::validation::ValidationOutcome;

pub trait ValidationListener: Send + Sync {
    fn on_started(&self, _project_key: &str) {}

    fn on_completion(&self, _outcome: ValidationOutcome) {}

    fn on_cancelled(&self, _project_key: &str) {}

    fn on_failure(&self, _project_key: &str, _failure: &ValidationFailure) {}
}

/// Ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ValidationListener for NoopListener {}
