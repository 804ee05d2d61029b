//! Row-based primary pass
//!
//! Streams every planned file once more, now known to be well formed, and
//! runs the compiled row evaluators on each data row. The same scan feeds the
//! summaries, the unique key groups and the relation key digests.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::checker::RowScanner;
use crate::planner::{ErrorTap, FileFlowPlanner, KeySide};
use crate::report::{ReportContext, SubmissionReport, SummaryCollector, TupleState};
use crate::restriction::{KeyDigest, Row, TypedValue, UniqueKeyCollector, ValueConventions};
use crate::store::SubmissionFileStore;

use super::context::ValidationContext;
use super::errors::ValidationFailure;
use super::validator::Validator;

pub struct PrimaryValidator;

impl Validator for PrimaryValidator {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn validate(&self, context: &mut ValidationContext, cancel: &CancellationToken) -> Result<(), ValidationFailure> {
        for flow in &context.plan.flows {
            if cancel.is_cancelled() {
                return Err(ValidationFailure::Cancelled);
            }
            let scan = FileScan {
                project_key: &context.project_key,
                flow,
                store: context.store.as_ref(),
                conventions: &context.conventions,
            };
            context.rows_scanned += scan.run(&mut context.report, &mut context.digests, cancel)?;
        }
        Ok(())
    }
}

struct FileScan<'a> {
    project_key: &'a str,
    flow: &'a FileFlowPlanner,
    store: &'a dyn SubmissionFileStore,
    conventions: &'a ValueConventions,
}

impl FileScan<'_> {
    fn run(
        &self,
        report: &mut SubmissionReport,
        digests: &mut HashMap<(usize, KeySide), KeyDigest>,
        cancel: &CancellationToken,
    ) -> Result<u64, ValidationFailure> {
        let flow = self.flow;
        let file_name = flow.file_name();
        let width = flow.field_names.len();

        let mut summaries: Vec<SummaryCollector> = flow
            .summaries
            .iter()
            .map(|s| SummaryCollector::new(&s.field_name, s.summary_type))
            .collect();
        let mut unique_keys: Vec<UniqueKeyCollector> = flow
            .unique_keys
            .iter()
            .map(|k| UniqueKeyCollector::new(k.field_indices.clone(), k.field_names.clone()))
            .collect();
        for projection in &flow.key_projections {
            digests.entry((projection.relation, projection.side)).or_default();
        }

        let mut scanner = RowScanner::new(file_name, self.store.open_decompressed(file_name)?, cancel.clone());
        let mut typed = vec![TypedValue::Raw; width];
        let mut state = TupleState::new(0);
        let mut invalid_rows = 0u64;

        while let Some(line) = scanner.next_line()? {
            if line.number == 1 {
                continue;
            }
            let text = String::from_utf8_lossy(line.bytes);
            let cells: Vec<&str> = text.split('\t').collect();
            if cells.len() != width {
                continue;
            }

            state.reset(line.number);
            typed.iter_mut().for_each(|t| *t = TypedValue::Raw);
            {
                let mut row = Row::new(self.project_key, &flow.field_names, &cells, &mut typed, self.conventions);
                for check in &flow.row_checks {
                    check.evaluate(&mut row, &mut state);
                }
            }

            for (collector, element) in summaries.iter_mut().zip(&flow.summaries) {
                let cell = cells[element.field_index];
                if self.conventions.is_missing(cell) {
                    collector.observe_missing();
                } else {
                    collector.observe(cell, typed[element.field_index].as_f64());
                }
            }
            for collector in &mut unique_keys {
                collector.observe(&cells, line.number);
            }
            for projection in &flow.key_projections {
                if let Some(digest) = digests.get_mut(&(projection.relation, projection.side)) {
                    digest.observe(&cells, &projection.field_indices, line.number);
                }
            }

            if !state.is_valid() {
                for tap in &flow.error_taps {
                    match tap {
                        ErrorTap::CountInvalidRows => invalid_rows += 1,
                        ErrorTap::ReportErrors => {
                            for error in state.drain_errors(file_name) {
                                report.report_error(error);
                            }
                        }
                    }
                }
            }
        }

        for collector in unique_keys {
            for error in collector.finish(file_name) {
                report.report_error(error);
            }
        }
        for collector in summaries {
            report.report_summary(file_name, collector.finish());
        }

        info!(
            file = %file_name,
            rows = scanner.lines_read().saturating_sub(1),
            invalid_rows,
            "primary pass finished"
        );
        Ok(scanner.lines_read())
    }
}
