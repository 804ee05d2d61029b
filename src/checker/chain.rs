//! Checker chains
//!
//! Checkers are held in an ordered list and driven iteratively. A checker
//! runs only while every checker before it can continue. A checker can
//! continue when it has reported no error so far, or when it is not
//! fail-fast. Error counts accumulate over the lifetime of the chain, so a
//! row chain remembers earlier rows.

use crate::report::{ReportContext, ValidationError};

use super::errors::CheckResult;

/// Common behaviour of file and row checkers
pub trait Checker: Send {
    fn name(&self) -> &'static str;

    /// Fail-fast checkers stop the rest of the chain once they report
    fn is_fail_fast(&self) -> bool {
        false
    }
}

/// Ordered checkers of one kind
pub struct CheckerChain<C: ?Sized + Checker> {
    checkers: Vec<Box<C>>,
    error_counts: Vec<u64>,
}

impl<C: ?Sized + Checker> CheckerChain<C> {
    pub fn new(checkers: Vec<Box<C>>) -> Self {
        let error_counts = vec![0; checkers.len()];
        Self {
            checkers,
            error_counts,
        }
    }

    /// Runs `self_check` on each checker in order while the chain can
    /// continue, reporting what they find. Returns `can_continue()`.
    pub fn check<F>(&mut self, report: &mut dyn ReportContext, mut self_check: F) -> CheckResult<bool>
    where
        F: FnMut(&mut C) -> CheckResult<Vec<ValidationError>>,
    {
        for (checker, count) in self.checkers.iter_mut().zip(self.error_counts.iter_mut()) {
            let errors = self_check(checker.as_mut())?;
            *count += errors.len() as u64;
            for error in errors {
                report.report_error(error);
            }
            if *count > 0 && checker.is_fail_fast() {
                break;
            }
        }
        Ok(self.can_continue())
    }

    pub fn can_continue(&self) -> bool {
        self.checkers
            .iter()
            .zip(&self.error_counts)
            .all(|(checker, count)| *count == 0 || !checker.is_fail_fast())
    }

    /// Errors reported so far by the checker at `index`
    pub fn error_count(&self, index: usize) -> u64 {
        self.error_counts.get(index).copied().unwrap_or(0)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }
}
