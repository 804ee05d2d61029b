//! Plan construction
//!
//! Produces one flow per selected file schema that has at least one matching
//! file. Only file names are inspected; contents are read during execution.
//!
//! Selection is closed over relations: selecting a schema also selects the
//! schemas it relates to, transitively.

use std::collections::BTreeSet;

use tracing::info;

use crate::dictionary::{CodeLists, Dictionary};
use crate::observability::Event;

use super::errors::{PlannerError, PlannerResult};
use super::passes::default_passes;
use super::plan::{DataTypeSelection, FileFlowPlanner, Plan};

/// Compiles a dictionary against the files of one submission
pub struct Planner<'a> {
    dictionary: &'a Dictionary,
    codelists: &'a CodeLists,
}

impl<'a> Planner<'a> {
    /// Creates a new planner
    pub fn new(dictionary: &'a Dictionary, codelists: &'a CodeLists) -> Self {
        Self {
            dictionary,
            codelists,
        }
    }

    /// Schema names to plan, closed over relation targets
    pub fn resolve_selection(&self, selection: &DataTypeSelection) -> PlannerResult<BTreeSet<String>> {
        let mut pending: Vec<String> = match selection {
            DataTypeSelection::All => {
                return Ok(self.dictionary.files.iter().map(|s| s.name.clone()).collect());
            }
            DataTypeSelection::Only(names) => names.iter().cloned().collect(),
        };

        let mut selected = BTreeSet::new();
        while let Some(name) = pending.pop() {
            let schema = self
                .dictionary
                .file_schema(&name)
                .ok_or_else(|| PlannerError::unknown_data_type(&name))?;
            if !selected.insert(name) {
                continue;
            }
            pending.extend(schema.relations.iter().map(|r| r.other.clone()));
        }
        Ok(selected)
    }

    /// Builds the plan for one project.
    ///
    /// `available_files` are the submission's file names. Flows follow the
    /// dictionary's schema order, so the same inputs always give the same plan.
    pub fn plan(
        &self,
        project_key: &str,
        selection: &DataTypeSelection,
        available_files: &[String],
    ) -> PlannerResult<Plan> {
        let selected = self.resolve_selection(selection)?;
        let mut passes = default_passes(self.codelists);

        let mut plan = Plan {
            project_key: project_key.to_string(),
            dictionary_version: self.dictionary.version.clone(),
            flows: Vec::new(),
            relations: Vec::new(),
        };

        for schema in self.dictionary.files.iter().filter(|s| selected.contains(&s.name)) {
            let pattern = schema.compile_pattern()?;
            let mut files: Vec<String> = available_files
                .iter()
                .filter(|name| pattern.is_match(name))
                .cloned()
                .collect();
            if files.is_empty() {
                continue;
            }
            files.sort();

            let mut flow = FileFlowPlanner::new(&schema.name, files, schema.field_names());
            for pass in passes.iter_mut() {
                pass.plan_file(schema, &mut flow)?;
            }
            plan.flows.push(flow);
        }

        for pass in passes.iter_mut() {
            pass.link(self.dictionary, &selected, &mut plan)?;
        }

        info!(
            event = Event::PlanBuilt.as_str(),
            project = %project_key,
            flows = plan.flows.len(),
            relations = plan.relations.len(),
            row_checks = plan.row_check_count(),
            "plan built"
        );

        Ok(plan)
    }
}
