//! Structural first pass

use tokio_util::sync::CancellationToken;

use crate::checker::FileCheckRunner;

use super::context::ValidationContext;
use super::errors::ValidationFailure;
use super::validator::Validator;

/// Runs the file and row checker chains over every planned file.
///
/// A file stopped by a fail-fast file checker does not stop the others.
pub struct FirstPassValidator;

impl Validator for FirstPassValidator {
    fn name(&self) -> &'static str {
        "first_pass"
    }

    fn validate(&self, context: &mut ValidationContext, cancel: &CancellationToken) -> Result<(), ValidationFailure> {
        let runner = FileCheckRunner::new(context.store.as_ref(), &context.conventions, cancel);
        for flow in &context.plan.flows {
            if cancel.is_cancelled() {
                return Err(ValidationFailure::Cancelled);
            }
            let outcome = runner.check(flow, &mut context.report)?;
            context.rows_scanned += outcome.lines;
        }
        Ok(())
    }
}
