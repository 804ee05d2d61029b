//! Range restriction

use crate::report::{ErrorParameterKey, ErrorType, TupleError, TupleState};

use super::Row;

/// Inclusive bounds on a coerced numeric value
#[derive(Debug)]
pub struct RangeCheck {
    pub field_index: usize,
    pub field_name: String,
    pub min: f64,
    pub max: f64,
    pub number: u32,
}

impl RangeCheck {
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        // Missing and uncoercible values were already handled by the type check
        let Some(value) = row.typed(self.field_index).as_f64() else {
            return;
        };

        if value < self.min || value > self.max {
            state.report(
                TupleError::new(ErrorType::OutOfRangeError, &self.field_name, row.cell(self.field_index))
                    .with_number(self.number)
                    .with_param(ErrorParameterKey::Min, self.min)
                    .with_param(ErrorParameterKey::Max, self.max),
            );
        }
    }
}
