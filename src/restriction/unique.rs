//! Unique key evaluation
//!
//! Rows are grouped by their composite key while the file streams through.
//! Every row of a group with more than one member is reported once the file
//! has been read, in line order.

use std::collections::HashMap;

use crate::report::{ErrorType, ValidationError};

/// Groups the rows of one file by one candidate key
#[derive(Debug)]
pub struct UniqueKeyCollector {
    field_indices: Vec<usize>,
    field_names: Vec<String>,
    groups: HashMap<Vec<String>, Vec<u64>>,
}

impl UniqueKeyCollector {
    pub fn new(field_indices: Vec<usize>, field_names: Vec<String>) -> Self {
        Self {
            field_indices,
            field_names,
            groups: HashMap::new(),
        }
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Records the key of a data row
    pub fn observe(&mut self, cells: &[&str], line: u64) {
        let key: Vec<String> = self
            .field_indices
            .iter()
            .map(|&i| cells.get(i).copied().unwrap_or("").to_string())
            .collect();
        self.groups.entry(key).or_default().push(line);
    }

    /// One error per row sharing its key with another row
    pub fn finish(self, file_name: &str) -> Vec<ValidationError> {
        let mut duplicates: Vec<(u64, Vec<String>)> = self
            .groups
            .into_iter()
            .filter(|(_, lines)| lines.len() > 1)
            .flat_map(|(key, lines)| lines.into_iter().map(move |line| (line, key.clone())))
            .collect();
        duplicates.sort_by_key(|(line, _)| *line);

        duplicates
            .into_iter()
            .map(|(line, key)| {
                ValidationError::new(file_name, ErrorType::UniqueValueError)
                    .with_fields(self.field_names.iter().cloned())
                    .at_line(line)
                    .with_value(format!("[{}]", key.join(", ")))
            })
            .collect()
    }
}
