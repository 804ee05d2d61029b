//! Required restriction

use crate::report::{ErrorType, TupleError, TupleState};

use super::Row;

/// Rejects empty cells, and missing codes unless they are accepted
#[derive(Debug)]
pub struct RequiredCheck {
    pub field_index: usize,
    pub field_name: String,
    pub accept_missing_code: bool,
    pub number: u32,
}

impl RequiredCheck {
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        let cell = row.cell(self.field_index);
        let missing = cell.is_empty()
            || (!self.accept_missing_code && row.conventions().is_missing_code(cell));

        if missing {
            state.mark_missing(&self.field_name);
            state.report(
                TupleError::new(ErrorType::MissingValueError, &self.field_name, cell)
                    .with_number(self.number),
            );
        }
    }
}
