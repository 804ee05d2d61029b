//! Validation orchestration
//!
//! A validation runs its validators strictly in order against its context.
//! Once the report holds any error after a validator, the remaining
//! validators are skipped. Cancellation is observed between validators and
//! inside row scans.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::observability::{Event, ObservationScope};
use crate::report::{ReportContext, SubmissionReport};

use super::context::ValidationContext;
use super::errors::ValidationFailure;
use super::validator::{default_validators, Validator};

/// Lifecycle of one validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Created,
    Started,
    /// Running validator `index` of `total`
    Executing { index: usize, total: usize },
    Completed,
    Failed,
    Cancelled,
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ValidationState::Completed | ValidationState::Failed | ValidationState::Cancelled
        )
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationState::Created => write!(f, "CREATED"),
            ValidationState::Started => write!(f, "STARTED"),
            ValidationState::Executing { index, total } => write!(f, "EXECUTING({}/{})", index + 1, total),
            ValidationState::Completed => write!(f, "COMPLETED"),
            ValidationState::Failed => write!(f, "FAILED"),
            ValidationState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Result of a validation that ran to its end
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub project_key: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub validators_run: Vec<&'static str>,
    pub validators_skipped: Vec<&'static str>,
    pub rows_scanned: u64,
    #[serde(skip)]
    pub report: SubmissionReport,
}

impl ValidationOutcome {
    /// A submission is valid as a whole iff nothing was reported
    pub fn is_valid(&self) -> bool {
        !self.report.has_errors()
    }

    pub fn error_count(&self) -> u64 {
        self.report.error_count()
    }
}

/// One end-to-end run of the validators against one project
pub struct Validation {
    run_id: Uuid,
    context: ValidationContext,
    validators: Vec<Box<dyn Validator>>,
    state: ValidationState,
}

impl Validation {
    /// Creates a validation with the default validators
    pub fn new(context: ValidationContext) -> Self {
        Self::with_validators(context, default_validators())
    }

    pub fn with_validators(context: ValidationContext, validators: Vec<Box<dyn Validator>>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            context,
            validators,
            state: ValidationState::Created,
        }
    }

    /// Project key, which identifies the validation in the executor
    pub fn id(&self) -> &str {
        self.context.project_key()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    pub fn into_context(self) -> ValidationContext {
        self.context
    }

    /// Runs every validator in order
    pub fn execute(&mut self, cancel: &CancellationToken) -> Result<ValidationOutcome, ValidationFailure> {
        let started_at = Utc::now();
        self.state = ValidationState::Started;
        let scope = ObservationScope::with_fields(
            "VALIDATION",
            vec![
                ("project", self.context.project_key().to_string()),
                ("run_id", self.run_id.to_string()),
            ],
        );

        let total = self.validators.len();
        let mut validators_run = Vec::new();
        let mut validators_skipped = Vec::new();

        for (index, validator) in self.validators.iter().enumerate() {
            if cancel.is_cancelled() {
                self.state = ValidationState::Cancelled;
                scope.cancel();
                return Err(ValidationFailure::Cancelled);
            }

            if self.context.report.has_errors() {
                info!(
                    event = Event::ValidatorSkipped.as_str(),
                    project = %self.context.project_key,
                    validator = validator.name(),
                    errors = self.context.report.error_count(),
                    "skipping validator"
                );
                validators_skipped.push(validator.name());
                continue;
            }

            self.state = ValidationState::Executing { index, total };
            info!(
                event = Event::ValidatorBegin.as_str(),
                project = %self.context.project_key,
                validator = validator.name(),
                state = %self.state,
            );

            if let Err(failure) = validator.validate(&mut self.context, cancel) {
                if failure.is_cancelled() {
                    self.state = ValidationState::Cancelled;
                    scope.cancel();
                } else {
                    self.state = ValidationState::Failed;
                    warn!(
                        project = %self.context.project_key,
                        validator = validator.name(),
                        error = %failure,
                        "validator failed"
                    );
                    scope.fail(&failure.to_string());
                }
                return Err(failure);
            }
            validators_run.push(validator.name());
        }

        self.state = ValidationState::Completed;
        let report = self.context.take_report();
        scope.complete();

        Ok(ValidationOutcome {
            project_key: self.context.project_key.clone(),
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            validators_run,
            validators_skipped,
            rows_scanned: self.context.rows_scanned,
            report,
        })
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation")
            .field("run_id", &self.run_id)
            .field("project_key", &self.context.project_key)
            .field("state", &self.state)
            .field("validators", &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>())
            .finish()
    }
}
