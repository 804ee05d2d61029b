//! dictgate - dictionary-driven validation of tabular submission files
//!
//! A versioned dictionary describes every file a submission may contain.
//! The planner compiles it, together with the file names actually present,
//! into a per-project plan; validators then check file structure, row
//! values and cross-file relations, reporting every finding with its file
//! and physical line number.

pub mod checker;
pub mod cli;
pub mod dictionary;
pub mod observability;
pub mod planner;
pub mod report;
pub mod restriction;
pub mod store;
pub mod validation;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use dictionary::{ActiveDictionary, CodeLists, Dictionary};
use planner::{DataTypeSelection, Plan};
use store::SubmissionFileStore;
use validation::{Validation, ValidationContext, ValidationFailure, ValidationOutcome};

/// Plans and validates one project synchronously on the calling thread.
///
/// The dictionary is checked first; authoring problems surface as
/// `ValidationFailure::Dictionary`. Data problems are never errors here,
/// they are in the outcome's report.
pub fn plan_and_validate(
    project_key: &str,
    dictionary: Dictionary,
    codelists: CodeLists,
    selection: &DataTypeSelection,
    store: Arc<dyn SubmissionFileStore>,
) -> Result<(Plan, ValidationOutcome), ValidationFailure> {
    let active = ActiveDictionary::new(dictionary, codelists)?;
    let context = ValidationContext::new(project_key, &active, selection, store)?;

    let mut validation = Validation::new(context);
    let outcome = validation.execute(&CancellationToken::new())?;
    Ok((validation.into_context().into_plan(), outcome))
}
