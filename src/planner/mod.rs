//! Planner subsystem
//!
//! Compiles an active dictionary and the file names of one submission into
//! a `Plan`: one `FileFlowPlanner` per selected schema with a file, holding
//! the ordered row evaluators, unique keys, summaries and error taps of that
//! file, plus the relation joins between files.
//!
//! # Design Principles
//!
//! - Deterministic: same dictionary and file names give the same plan
//! - Names only: file contents are never read while planning
//! - Early: script and code list problems are plan errors, never row errors

mod errors;
mod explain;
mod passes;
mod plan;
mod planner;

pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use explain::{ExplainFlow, ExplainPlan};
pub use passes::{default_passes, PlanningPass};
pub use plan::{
    DataTypeSelection, ErrorTap, FileFlowPlanner, KeyProjection, KeySide, MissingReference, Plan,
    ReferenceKind, RelationPlan, SummaryElement, UniqueKeyElement,
};
pub use planner::Planner;
