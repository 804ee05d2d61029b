//! Validator stages

use tokio_util::sync::CancellationToken;

use super::context::ValidationContext;
use super::errors::ValidationFailure;
use super::first_pass::FirstPassValidator;
use super::primary::PrimaryValidator;
use super::relational::RelationalValidator;

/// One stage of a validation.
///
/// A stage reads the submission through the context and writes its findings
/// into the context's report. It returns an error only when it cannot finish.
pub trait Validator: Send {
    fn name(&self) -> &'static str;

    fn validate(&self, context: &mut ValidationContext, cancel: &CancellationToken) -> Result<(), ValidationFailure>;
}

/// Structural, row-based, then relational
pub fn default_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(FirstPassValidator),
        Box::new(PrimaryValidator),
        Box::new(RelationalValidator),
    ]
}
