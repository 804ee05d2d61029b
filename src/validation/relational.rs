//! Relational pass
//!
//! Joins the key digests the primary pass collected. Both sides of every
//! relation have been fully read by then.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::planner::KeySide;
use crate::report::ReportContext;
use crate::restriction::KeyDigest;

use super::context::ValidationContext;
use super::errors::ValidationFailure;
use super::validator::Validator;

pub struct RelationalValidator;

impl Validator for RelationalValidator {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn validate(&self, context: &mut ValidationContext, cancel: &CancellationToken) -> Result<(), ValidationFailure> {
        let empty = KeyDigest::new();
        for (id, relation) in context.plan.relations.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ValidationFailure::Cancelled);
            }
            let child = context.digests.get(&(id, KeySide::Child)).unwrap_or(&empty);
            let parent = context.digests.get(&(id, KeySide::Parent)).unwrap_or(&empty);

            let errors = relation.join.run(child, parent, &context.conventions);
            debug!(
                child = %relation.join.child_file,
                parent = %relation.join.parent_file,
                errors = errors.len(),
                "relation joined"
            );
            for error in errors {
                context.report.report_error(error);
            }
        }
        context.digests.clear();
        Ok(())
    }
}
