//! Validation report
//!
//! Submitter-facing findings: typed errors, per-row accumulation, per-field
//! summaries and the per-file report that collects them.

mod context;
mod error;
mod summary;
mod tuple;

pub use context::{
    ceil_div, floor_div, FileReport, ReportContext, SubmissionReport, DEFAULT_MAX_ERRORS_PER_FILE,
};
pub use error::{ErrorCategory, ErrorLevel, ErrorParam, ErrorParameterKey, ErrorType, ValidationError};
pub use summary::{FieldSummary, SummaryCollector, SummaryStats};
pub use tuple::{TupleError, TupleState};
