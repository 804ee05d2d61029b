//! Restriction evaluators
//!
//! The planner compiles each dictionary restriction into one of the
//! evaluators below. Row evaluators run in plan order against a `Row`:
//! value type coercion first, then the field restrictions in declared order.
//! Unique keys and relations are evaluated over whole files instead.
//!
//! Every evaluator except `RequiredCheck` ignores missing values.

mod codelist;
mod discrete;
mod range;
mod relation;
mod required;
mod script;
mod unique;
mod value;

pub use codelist::CodeListCheck;
pub use discrete::DiscreteValuesCheck;
pub use range::RangeCheck;
pub use relation::{KeyDigest, RelationJoin};
pub use required::RequiredCheck;
pub use script::{ScriptCheck, ScriptCompileError, ScriptPredicate};
pub use unique::UniqueKeyCollector;
pub use value::{TypedValue, ValueTypeCheck};

use serde::{Deserialize, Serialize};

use crate::report::TupleState;

/// Conventions for special cell values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueConventions {
    /// Codes meaning "not applicable" or "not collected", treated as missing
    pub missing_codes: Vec<String>,
    /// Values never allowed in a required field
    pub forbidden_values: Vec<String>,
}

impl Default for ValueConventions {
    fn default() -> Self {
        Self {
            missing_codes: vec!["-777".to_string(), "-888".to_string()],
            forbidden_values: vec!["-999".to_string()],
        }
    }
}

impl ValueConventions {
    pub fn is_missing_code(&self, value: &str) -> bool {
        self.missing_codes.iter().any(|c| c == value)
    }

    /// Empty cells and missing codes
    pub fn is_missing(&self, value: &str) -> bool {
        value.is_empty() || self.is_missing_code(value)
    }

    pub fn is_forbidden(&self, value: &str) -> bool {
        self.forbidden_values.iter().any(|f| f == value)
    }
}

/// One data row during evaluation
pub struct Row<'a> {
    project_key: &'a str,
    field_names: &'a [String],
    cells: &'a [&'a str],
    typed: &'a mut [TypedValue],
    conventions: &'a ValueConventions,
}

impl<'a> Row<'a> {
    /// `cells` and `typed` must both have one entry per field
    pub fn new(
        project_key: &'a str,
        field_names: &'a [String],
        cells: &'a [&'a str],
        typed: &'a mut [TypedValue],
        conventions: &'a ValueConventions,
    ) -> Self {
        Self {
            project_key,
            field_names,
            cells,
            typed,
            conventions,
        }
    }

    pub fn project_key(&self) -> &str {
        self.project_key
    }

    pub fn cell(&self, index: usize) -> &'a str {
        self.cells.get(index).copied().unwrap_or("")
    }

    pub fn typed(&self, index: usize) -> TypedValue {
        self.typed.get(index).copied().unwrap_or(TypedValue::Raw)
    }

    pub fn set_typed(&mut self, index: usize, value: TypedValue) {
        if let Some(slot) = self.typed.get_mut(index) {
            *slot = value;
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|f| f == name)
    }

    pub fn conventions(&self) -> &ValueConventions {
        self.conventions
    }

    pub fn is_missing(&self, index: usize) -> bool {
        self.conventions.is_missing(self.cell(index))
    }
}

/// A compiled row-level evaluator
#[derive(Debug)]
pub enum RowCheck {
    ValueType(ValueTypeCheck),
    Required(RequiredCheck),
    Range(RangeCheck),
    DiscreteValues(DiscreteValuesCheck),
    CodeList(CodeListCheck),
    Script(ScriptCheck),
}

impl RowCheck {
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        match self {
            RowCheck::ValueType(check) => check.evaluate(row, state),
            RowCheck::Required(check) => check.evaluate(row, state),
            RowCheck::Range(check) => check.evaluate(row, state),
            RowCheck::DiscreteValues(check) => check.evaluate(row, state),
            RowCheck::CodeList(check) => check.evaluate(row, state),
            RowCheck::Script(check) => check.evaluate(row, state),
        }
    }

    /// Field the evaluator is attached to
    pub fn field_name(&self) -> &str {
        match self {
            RowCheck::ValueType(check) => &check.field_name,
            RowCheck::Required(check) => &check.field_name,
            RowCheck::Range(check) => &check.field_name,
            RowCheck::DiscreteValues(check) => &check.field_name,
            RowCheck::CodeList(check) => &check.field_name,
            RowCheck::Script(check) => &check.field_name,
        }
    }

    /// Short description for plan explanations
    pub fn describe(&self) -> String {
        match self {
            RowCheck::ValueType(check) => format!("value_type({})", check.value_type),
            RowCheck::Required(check) => format!(
                "required(accept_missing_code: {})",
                check.accept_missing_code
            ),
            RowCheck::Range(check) => format!("range[{}, {}]", check.min, check.max),
            RowCheck::DiscreteValues(check) => format!("discrete_values{:?}", check.listed),
            RowCheck::CodeList(check) => format!("codelist({})", check.codelist),
            RowCheck::Script(check) => format!("script({})", check.predicate.source()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conventions() {
        let conventions = ValueConventions::default();
        assert!(conventions.is_missing(""));
        assert!(conventions.is_missing("-777"));
        assert!(conventions.is_missing("-888"));
        assert!(!conventions.is_missing("-999"));
        assert!(conventions.is_forbidden("-999"));
        assert!(!conventions.is_missing(" "));
    }
}
