//! Per-project validation state

use std::collections::HashMap;
use std::sync::Arc;

use crate::dictionary::{ActiveDictionary, CodeLists, Dictionary};
use crate::planner::{DataTypeSelection, KeySide, Plan, Planner};
use crate::report::{SubmissionReport, DEFAULT_MAX_ERRORS_PER_FILE};
use crate::restriction::{KeyDigest, ValueConventions};
use crate::store::SubmissionFileStore;

use super::errors::ValidationFailure;

/// Everything one validation reads and writes.
///
/// Owned exclusively by its validation. The dictionary and code lists are
/// shared read-only with every other validation of the run.
#[derive(Debug)]
pub struct ValidationContext {
    pub(super) project_key: String,
    pub(super) dictionary: Arc<Dictionary>,
    pub(super) codelists: Arc<CodeLists>,
    pub(super) store: Arc<dyn SubmissionFileStore>,
    pub(super) plan: Plan,
    pub(super) conventions: ValueConventions,
    pub(super) report: SubmissionReport,
    /// Relation keys projected by the primary pass, by relation and side
    pub(super) digests: HashMap<(usize, KeySide), KeyDigest>,
    pub(super) rows_scanned: u64,
}

impl ValidationContext {
    /// Lists the submission's files and plans the validation
    pub fn new(
        project_key: impl Into<String>,
        active: &ActiveDictionary,
        selection: &DataTypeSelection,
        store: Arc<dyn SubmissionFileStore>,
    ) -> Result<Self, ValidationFailure> {
        let project_key = project_key.into();
        let files = store.file_names()?;
        let plan = Planner::new(&active.dictionary, &active.codelists).plan(&project_key, selection, &files)?;

        Ok(Self {
            project_key,
            dictionary: Arc::clone(&active.dictionary),
            codelists: Arc::clone(&active.codelists),
            store,
            plan,
            conventions: ValueConventions::default(),
            report: SubmissionReport::new(DEFAULT_MAX_ERRORS_PER_FILE),
            digests: HashMap::new(),
            rows_scanned: 0,
        })
    }

    pub fn with_conventions(mut self, conventions: ValueConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn with_max_errors_per_file(mut self, max_errors_per_file: usize) -> Self {
        self.report = SubmissionReport::new(max_errors_per_file);
        self
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn codelists(&self) -> &CodeLists {
        &self.codelists
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn store(&self) -> &dyn SubmissionFileStore {
        self.store.as_ref()
    }

    pub fn conventions(&self) -> &ValueConventions {
        &self.conventions
    }

    pub fn report(&self) -> &SubmissionReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut SubmissionReport {
        &mut self.report
    }

    /// Physical lines read so far, over every pass
    pub fn rows_scanned(&self) -> u64 {
        self.rows_scanned
    }

    pub(super) fn take_report(&mut self) -> SubmissionReport {
        let fresh = SubmissionReport::new(self.report.max_errors_per_file());
        std::mem::replace(&mut self.report, fresh)
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }
}
