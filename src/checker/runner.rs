//! First pass over one file
//!
//! Drives a file through its states: the file checker chain first, then,
//! when every file checker can continue, the row checker chain over each
//! data line.

use std::borrow::Cow;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::observability::{Event, ObservationScope};
use crate::planner::FileFlowPlanner;
use crate::report::{ErrorParameterKey, ErrorType, ReportContext, ValidationError};
use crate::restriction::ValueConventions;
use crate::store::SubmissionFileStore;

use super::chain::CheckerChain;
use super::errors::CheckResult;
use super::file::{file_checkers, FileChecker, FileTarget};
use super::row::{row_checkers, RowChecker, RowTarget};
use super::scanner::RowScanner;
use super::state::FileCheckState;

/// How far a file got and how many lines were read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCheckOutcome {
    pub state: FileCheckState,
    /// Physical lines read during the row pass, header included
    pub lines: u64,
}

/// Runs the structural checks of the first pass
pub struct FileCheckRunner<'a> {
    store: &'a dyn SubmissionFileStore,
    conventions: &'a ValueConventions,
    cancel: &'a CancellationToken,
}

impl<'a> FileCheckRunner<'a> {
    pub fn new(
        store: &'a dyn SubmissionFileStore,
        conventions: &'a ValueConventions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            store,
            conventions,
            cancel,
        }
    }

    /// Checks one planned file, reporting into `report`
    pub fn check(&self, flow: &FileFlowPlanner, report: &mut dyn ReportContext) -> CheckResult<FileCheckOutcome> {
        let file_name = flow.file_name();
        let scope = ObservationScope::with_fields(
            Event::FileCheck.as_str(),
            vec![("file", file_name.to_string()), ("schema", flow.schema_name.clone())],
        );
        let mut state = FileCheckState::NotChecked;

        advance(&mut state, FileCheckState::FileLevelChecking);
        let target = FileTarget {
            flow,
            store: self.store,
        };
        let mut file_chain: CheckerChain<dyn FileChecker> = CheckerChain::new(file_checkers());
        if !file_chain.check(report, |checker| checker.self_check(&target))? {
            advance(&mut state, FileCheckState::Aborted);
            info!(
                event = Event::FileCheck.as_str(),
                file = %file_name,
                state = %state,
                errors = report.file_error_count(file_name),
                "file level checks failed, rows not read"
            );
            scope.complete();
            return Ok(FileCheckOutcome { state, lines: 0 });
        }

        advance(&mut state, FileCheckState::RowLevelChecking);
        let lines = self.check_rows(flow, report)?;
        advance(&mut state, FileCheckState::Done);

        info!(
            event = Event::FileCheck.as_str(),
            file = %file_name,
            state = %state,
            lines,
            errors = report.file_error_count(file_name),
            "file checked"
        );
        scope.complete();
        Ok(FileCheckOutcome { state, lines })
    }

    fn check_rows(&self, flow: &FileFlowPlanner, report: &mut dyn ReportContext) -> CheckResult<u64> {
        let file_name = flow.file_name();
        let mut scanner = RowScanner::new(
            file_name,
            self.store.open_decompressed(file_name)?,
            self.cancel.clone(),
        );
        let mut row_chain: CheckerChain<dyn RowChecker> = CheckerChain::new(row_checkers());
        let mut data_rows = 0u64;

        while let Some(line) = scanner.next_line()? {
            if !line.terminated {
                report.report_error(
                    ValidationError::new(file_name, ErrorType::LineTerminatorMissingError)
                        .at_line(line.number),
                );
            }
            if line.number == 1 {
                continue;
            }
            data_rows += 1;

            let text = String::from_utf8_lossy(line.bytes);
            let valid_utf8 = matches!(text, Cow::Borrowed(_));
            let cells: Vec<&str> = text.split('\t').collect();
            let target = RowTarget {
                file_name,
                line: line.number,
                cells: &cells,
                valid_utf8,
                header_len: flow.field_names.len(),
                required_fields: &flow.required_fields,
                conventions: self.conventions,
            };
            row_chain.check(report, |checker| checker.self_check(&target))?;
        }

        if data_rows == 0 {
            report.report_error(
                ValidationError::new(file_name, ErrorType::MissingRowsError)
                    .with_param(ErrorParameterKey::Schema, flow.schema_name.as_str()),
            );
        }

        debug!(file = %file_name, rows = data_rows, "row pass finished");
        Ok(scanner.lines_read())
    }
}

fn advance(state: &mut FileCheckState, next: FileCheckState) {
    debug_assert!(state.can_transition_to(next), "{} -> {}", state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SubmissionReport;
    use crate::store::MemoryFileStore;

    fn flow(file: &str) -> FileFlowPlanner {
        let mut flow = FileFlowPlanner::new(
            "donor",
            vec![file.to_string()],
            vec!["donor_id".to_string(), "donor_sex".to_string()],
        );
        flow.required_fields.push((0, "donor_id".to_string()));
        flow
    }

    fn check(store: &MemoryFileStore, file: &str) -> (FileCheckOutcome, SubmissionReport) {
        let conventions = ValueConventions::default();
        let cancel = CancellationToken::new();
        let mut report = SubmissionReport::default();
        let outcome = FileCheckRunner::new(store, &conventions, &cancel)
            .check(&flow(file), &mut report)
            .unwrap();
        (outcome, report)
    }

    fn types(report: &SubmissionReport) -> Vec<ErrorType> {
        report.errors().map(|e| e.error_type).collect()
    }

    #[test]
    fn test_clean_file_done() {
        let store = MemoryFileStore::new().with_file("donor.txt", "donor_id\tdonor_sex\nD1\tM\nD2\tF\n");
        let (outcome, report) = check(&store, "donor.txt");
        assert_eq!(outcome, FileCheckOutcome { state: FileCheckState::Done, lines: 3 });
        assert!(!report.has_errors());
    }

    #[test]
    fn test_header_error_aborts_row_pass() {
        let store = MemoryFileStore::new().with_file("donor.txt", "donor_sex\tdonor_id\nD1\n");
        let (outcome, report) = check(&store, "donor.txt");
        assert_eq!(outcome.state, FileCheckState::Aborted);
        assert_eq!(types(&report), vec![ErrorType::FileHeaderError]);
    }

    #[test]
    fn test_row_errors_carry_physical_lines() {
        let store = MemoryFileStore::new()
            .with_file("donor.txt", "donor_id\tdonor_sex\nD1\tM\nD2\nD3\tF\textra\n-999\tM");
        let (outcome, report) = check(&store, "donor.txt");
        assert_eq!(outcome.state, FileCheckState::Done);

        let found: Vec<(ErrorType, Option<u64>)> =
            report.errors().map(|e| (e.error_type, e.line_number)).collect();
        assert_eq!(
            found,
            vec![
                (ErrorType::StructurallyInvalidRowError, Some(3)),
                (ErrorType::StructurallyInvalidRowError, Some(4)),
                (ErrorType::LineTerminatorMissingError, Some(5)),
                (ErrorType::ForbiddenValueError, Some(5)),
            ]
        );
    }

    #[test]
    fn test_header_only_file_has_missing_rows() {
        let store = MemoryFileStore::new().with_file("donor.txt", "donor_id\tdonor_sex\n");
        let (_, report) = check(&store, "donor.txt");
        assert_eq!(types(&report), vec![ErrorType::MissingRowsError]);
    }

    #[test]
    fn test_cancelled_scan() {
        let mut content = String::from("donor_id\tdonor_sex\n");
        for i in 0..20_000 {
            content.push_str(&format!("D{}\tM\n", i));
        }
        let store = MemoryFileStore::new().with_file("donor.txt", content);
        let conventions = ValueConventions::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut report = SubmissionReport::default();

        let err = FileCheckRunner::new(&store, &conventions, &cancel)
            .check(&flow("donor.txt"), &mut report)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
