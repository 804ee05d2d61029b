//! Per-row error accumulation

use std::collections::BTreeSet;

use serde_json::Value;

use super::error::{ErrorParameterKey, ErrorType, ValidationError};

/// Errors found on one row, before they are attached to a file
#[derive(Debug, Clone, PartialEq)]
pub struct TupleError {
    pub error_type: ErrorType,
    pub field_names: Vec<String>,
    pub number: u32,
    pub value: String,
    pub params: Vec<(ErrorParameterKey, Value)>,
}

impl TupleError {
    pub fn new(error_type: ErrorType, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            error_type,
            field_names: vec![field.into()],
            number: 0,
            value: value.into(),
            params: Vec::new(),
        }
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    pub fn with_param(mut self, key: ErrorParameterKey, value: impl Into<Value>) -> Self {
        self.params.push((key, value.into()));
        self
    }
}

/// State of one row while its restrictions are evaluated
#[derive(Debug, Clone, Default)]
pub struct TupleState {
    line: u64,
    errors: Vec<TupleError>,
    structurally_invalid: bool,
    missing_fields: BTreeSet<String>,
}

impl TupleState {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    /// Reuse the allocation for the next row
    pub fn reset(&mut self, line: u64) {
        self.line = line;
        self.errors.clear();
        self.structurally_invalid = false;
        self.missing_fields.clear();
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn report(&mut self, error: TupleError) {
        if error.error_type.is_structural() {
            self.structurally_invalid = true;
        }
        self.errors.push(error);
    }

    /// Records that a field had no usable value
    pub fn mark_missing(&mut self, field: &str) {
        self.missing_fields.insert(field.to_string());
    }

    pub fn is_missing(&self, field: &str) -> bool {
        self.missing_fields.contains(field)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_structurally_valid(&self) -> bool {
        !self.structurally_invalid
    }

    pub fn errors(&self) -> &[TupleError] {
        &self.errors
    }

    /// Converts the row errors into file errors, draining the state
    pub fn drain_errors(&mut self, file_name: &str) -> Vec<ValidationError> {
        let line = self.line;
        self.errors
            .drain(..)
            .map(|e| {
                let mut error = ValidationError::new(file_name, e.error_type)
                    .with_fields(e.field_names)
                    .at_line(line)
                    .with_value(e.value)
                    .with_number(e.number);
                for (key, value) in e.params {
                    error = error.with_param(key, value);
                }
                error
            })
            .collect()
    }
}
