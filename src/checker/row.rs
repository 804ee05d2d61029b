//! Row-level structural checkers
//!
//! Run on every data line of a file whose file-level checks passed. None of
//! them is fail-fast: every line is checked so one pass surfaces every
//! malformed row.

use crate::report::{ErrorParameterKey, ErrorType, ValidationError};
use crate::restriction::ValueConventions;

use super::chain::Checker;
use super::errors::CheckResult;

/// One data line under check
pub struct RowTarget<'a> {
    pub file_name: &'a str,
    pub line: u64,
    pub cells: &'a [&'a str],
    pub valid_utf8: bool,
    pub header_len: usize,
    pub required_fields: &'a [(usize, String)],
    pub conventions: &'a ValueConventions,
}

pub trait RowChecker: Checker {
    fn self_check(&mut self, target: &RowTarget<'_>) -> CheckResult<Vec<ValidationError>>;
}

/// Default row checkers in execution order
pub fn row_checkers() -> Vec<Box<dyn RowChecker>> {
    vec![
        Box::new(CharsetChecker),
        Box::new(ForbiddenValueChecker),
        Box::new(ColumnCountChecker),
    ]
}

pub struct CharsetChecker;

impl Checker for CharsetChecker {
    fn name(&self) -> &'static str {
        "charset"
    }
}

impl RowChecker for CharsetChecker {
    fn self_check(&mut self, target: &RowTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        if target.valid_utf8 {
            return Ok(Vec::new());
        }
        Ok(vec![ValidationError::new(target.file_name, ErrorType::InvalidCharsetRowError)
            .at_line(target.line)
            .with_value(target.cells.join("\t"))])
    }
}

/// Placeholder values are never accepted in required fields
pub struct ForbiddenValueChecker;

impl Checker for ForbiddenValueChecker {
    fn name(&self) -> &'static str {
        "forbidden_value"
    }
}

impl RowChecker for ForbiddenValueChecker {
    fn self_check(&mut self, target: &RowTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        Ok(target
            .required_fields
            .iter()
            .filter_map(|(index, name)| {
                let cell = target.cells.get(*index)?;
                target.conventions.is_forbidden(cell).then(|| {
                    ValidationError::new(target.file_name, ErrorType::ForbiddenValueError)
                        .with_field(name.as_str())
                        .at_line(target.line)
                        .with_value(*cell)
                        .with_param(ErrorParameterKey::Value, *cell)
                })
            })
            .collect())
    }
}

/// Every line must have as many cells as the header
pub struct ColumnCountChecker;

impl Checker for ColumnCountChecker {
    fn name(&self) -> &'static str {
        "column_count"
    }
}

impl RowChecker for ColumnCountChecker {
    fn self_check(&mut self, target: &RowTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        if target.cells.len() == target.header_len {
            return Ok(Vec::new());
        }
        Ok(vec![ValidationError::new(target.file_name, ErrorType::StructurallyInvalidRowError)
            .at_line(target.line)
            .with_value(target.cells.len().to_string())
            .with_param(ErrorParameterKey::Expected, target.header_len)])
    }
}
