//! Value type coercion

use crate::dictionary::ValueType;
use crate::report::{ErrorParameterKey, ErrorType, TupleError, TupleState};

use super::Row;

/// Result of coercing one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    /// Not coerced: text fields and fields without a numeric type
    Raw,
    /// Empty cell or missing code
    Missing,
    /// Coercion failed
    Invalid,
    Integer(i64),
    Decimal(f64),
}

impl TypedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Integer(i) => Some(*i as f64),
            TypedValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Parses a cell as `value_type`. Non-numeric types stay raw.
    pub fn parse(value_type: ValueType, cell: &str) -> TypedValue {
        match value_type {
            ValueType::Integer => cell
                .parse::<i64>()
                .map(TypedValue::Integer)
                .unwrap_or(TypedValue::Invalid),
            ValueType::Decimal => match cell.parse::<f64>() {
                Ok(d) if d.is_finite() => TypedValue::Decimal(d),
                _ => TypedValue::Invalid,
            },
            ValueType::Text | ValueType::Datetime => TypedValue::Raw,
        }
    }
}

/// Coerces a field to its declared type
#[derive(Debug)]
pub struct ValueTypeCheck {
    pub field_index: usize,
    pub field_name: String,
    pub value_type: ValueType,
}

impl ValueTypeCheck {
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        let cell = row.cell(self.field_index);
        if row.conventions().is_missing(cell) {
            row.set_typed(self.field_index, TypedValue::Missing);
            state.mark_missing(&self.field_name);
            return;
        }

        let typed = TypedValue::parse(self.value_type, cell);
        if typed == TypedValue::Invalid {
            state.report(
                TupleError::new(ErrorType::ValueTypeError, &self.field_name, cell)
                    .with_param(ErrorParameterKey::Expected, self.value_type.type_name()),
            );
        }
        row.set_typed(self.field_index, typed);
    }
}
