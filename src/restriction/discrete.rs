//! Discrete values restriction

use std::collections::HashSet;

use serde_json::Value;

use crate::report::{ErrorParameterKey, ErrorType, TupleError, TupleState};

use super::Row;

#[derive(Debug)]
pub struct DiscreteValuesCheck {
    pub field_index: usize,
    pub field_name: String,
    /// Values in declared order, for error parameters
    pub listed: Vec<String>,
    pub accepted: HashSet<String>,
    pub number: u32,
}

impl DiscreteValuesCheck {
    pub fn new(field_index: usize, field_name: impl Into<String>, values: &[String], number: u32) -> Self {
        Self {
            field_index,
            field_name: field_name.into(),
            listed: values.to_vec(),
            accepted: values.iter().cloned().collect(),
            number,
        }
    }

    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        if row.is_missing(self.field_index) {
            return;
        }
        let cell = row.cell(self.field_index);
        if !self.accepted.contains(cell) {
            state.report(
                TupleError::new(ErrorType::DiscreteValuesError, &self.field_name, cell)
                    .with_number(self.number)
                    .with_param(ErrorParameterKey::Expected, Value::from(self.listed.clone())),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::testing::RowFixture;
    use crate::restriction::RowCheck;

    fn check() -> Vec<RowCheck> {
        let values = vec!["alive".to_string(), "deceased".to_string()];
        vec![RowCheck::DiscreteValues(DiscreteValuesCheck::new(0, "vital_status", &values, 0))]
    }

    #[test]
    fn test_membership() {
        assert!(RowFixture::new(&["vital_status"], &["alive"]).run(&check()).is_valid());
        let state = RowFixture::new(&["vital_status"], &["Alive"]).run(&check());
        assert_eq!(state.errors()[0].error_type, ErrorType::DiscreteValuesError);
    }

    #[test]
    fn test_missing_skipped() {
        assert!(RowFixture::new(&["vital_status"], &[""]).run(&check()).is_valid());
    }
}
