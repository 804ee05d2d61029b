//! Code list restriction

use std::collections::HashSet;
use std::sync::Arc;

use crate::report::{ErrorParameterKey, ErrorType, TupleError, TupleState};

use super::Row;

/// Accepts any code or value of a code list
#[derive(Debug)]
pub struct CodeListCheck {
    pub field_index: usize,
    pub field_name: String,
    pub codelist: String,
    /// Shared between every field using the same list
    pub accepted: Arc<HashSet<String>>,
    pub number: u32,
}

impl CodeListCheck {
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        if row.is_missing(self.field_index) {
            return;
        }
        let cell = row.cell(self.field_index);
        if !self.accepted.contains(cell) {
            state.report(
                TupleError::new(ErrorType::CodelistError, &self.field_name, cell)
                    .with_number(self.number)
                    .with_param(ErrorParameterKey::Expected, self.codelist.as_str()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::CodeList;
    use crate::restriction::testing::RowFixture;
    use crate::restriction::RowCheck;

    fn check() -> Vec<RowCheck> {
        let list = CodeList::new("sex").with_term("1", "male").with_term("2", "female");
        vec![RowCheck::CodeList(CodeListCheck {
            field_index: 1,
            field_name: "donor_sex".to_string(),
            codelist: "sex".to_string(),
            accepted: Arc::new(list.accepted_values()),
            number: 0,
        })]
    }

    #[test]
    fn test_code_or_value_accepted() {
        assert!(RowFixture::new(&["donor_id", "donor_sex"], &["D1", "1"]).run(&check()).is_valid());
        assert!(RowFixture::new(&["donor_id", "donor_sex"], &["D1", "male"]).run(&check()).is_valid());
    }

    #[test]
    fn test_unknown_code_rejected() {
        let state = RowFixture::new(&["donor_id", "donor_sex"], &["D1", "3"]).run(&check());
        let error = &state.errors()[0];
        assert_eq!(error.error_type, ErrorType::CodelistError);
        assert_eq!(error.field_names, vec!["donor_sex"]);
        assert_eq!(error.value, "3");
    }

    #[test]
    fn test_missing_code_skipped() {
        assert!(RowFixture::new(&["donor_id", "donor_sex"], &["D1", "-777"]).run(&check()).is_valid());
    }
}
