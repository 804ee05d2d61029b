//! Relation joins
//!
//! Keys are projected out of both files while they stream through the
//! primary pass. The join itself is a hash join: the parent keys are put in a
//! set once, then every child key is probed, so the cost is linear in the
//! size of both files.
//!
//! Optional relation fields only participate when every one of them is
//! populated. Otherwise the child is matched on the required fields alone.

use std::collections::HashSet;

use serde_json::Value;

use crate::report::{ErrorParameterKey, ErrorType, ValidationError};

use super::ValueConventions;

/// Key columns of every data row of one file, in line order
#[derive(Debug, Clone, Default)]
pub struct KeyDigest {
    rows: Vec<(u64, Vec<String>)>,
}

impl KeyDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects `indices` out of a data row
    pub fn observe(&mut self, cells: &[&str], indices: &[usize], line: u64) {
        let key = indices
            .iter()
            .map(|&i| cells.get(i).copied().unwrap_or("").to_string())
            .collect();
        self.rows.push((line, key));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (u64, &[String])> {
        self.rows.iter().map(|(line, key)| (*line, key.as_slice()))
    }
}

/// One relation between two present files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationJoin {
    pub child_schema: String,
    pub child_file: String,
    pub child_fields: Vec<String>,
    pub parent_schema: String,
    pub parent_file: String,
    pub parent_fields: Vec<String>,
    pub optionals: Vec<usize>,
    pub bidirectional: bool,
}

impl RelationJoin {
    /// Positions that always participate in the key
    pub fn required_positions(&self) -> Vec<usize> {
        (0..self.child_fields.len())
            .filter(|i| !self.optionals.contains(i))
            .collect()
    }

    /// Joins the two digests and returns every violation, child errors first
    pub fn run(
        &self,
        child: &KeyDigest,
        parent: &KeyDigest,
        conventions: &ValueConventions,
    ) -> Vec<ValidationError> {
        let required = self.required_positions();
        let parent_full: HashSet<&[String]> = parent.rows().map(|(_, key)| key).collect();
        let parent_required: HashSet<Vec<&str>> = if self.optionals.is_empty() {
            HashSet::new()
        } else {
            parent.rows().map(|(_, key)| project(key, &required)).collect()
        };

        let mut errors = Vec::new();

        for (line, key) in child.rows() {
            if required.iter().any(|&i| conventions.is_missing(&key[i])) {
                continue;
            }
            let optionals_present = self
                .optionals
                .iter()
                .all(|&i| !conventions.is_missing(&key[i]));

            let matched = if optionals_present {
                parent_full.contains(key)
            } else {
                parent_required.contains(&project(key, &required))
            };

            if !matched {
                errors.push(
                    ValidationError::new(&self.child_file, ErrorType::RelationValueError)
                        .with_fields(self.child_fields.iter().cloned())
                        .at_line(line)
                        .with_value(render_key(key))
                        .with_param(ErrorParameterKey::OtherSchema, self.parent_schema.as_str())
                        .with_param(
                            ErrorParameterKey::OtherFields,
                            Value::from(self.parent_fields.clone()),
                        ),
                );
            }
        }

        if self.bidirectional {
            let child_keys: HashSet<&[String]> = child.rows().map(|(_, key)| key).collect();
            for (line, key) in parent.rows() {
                if key.iter().any(|v| conventions.is_missing(v)) || child_keys.contains(key) {
                    continue;
                }
                errors.push(
                    ValidationError::new(&self.parent_file, ErrorType::RelationParentValueError)
                        .with_fields(self.parent_fields.iter().cloned())
                        .at_line(line)
                        .with_value(render_key(key))
                        .with_param(ErrorParameterKey::OtherSchema, self.child_schema.as_str())
                        .with_param(
                            ErrorParameterKey::OtherFields,
                            Value::from(self.child_fields.clone()),
                        ),
                );
            }
        }

        errors
    }
}

fn project<'a>(key: &'a [String], positions: &[usize]) -> Vec<&'a str> {
    positions.iter().map(|&i| key[i].as_str()).collect()
}

fn render_key(key: &[String]) -> String {
    format!("[{}]", key.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(optionals: Vec<usize>, bidirectional: bool, arity: usize) -> RelationJoin {
        let fields: Vec<String> = ["donor_id", "specimen_id"][..arity]
            .iter()
            .map(|s| s.to_string())
            .collect();
        RelationJoin {
            child_schema: "sample".to_string(),
            child_file: "sample.txt".to_string(),
            child_fields: fields.clone(),
            parent_schema: "specimen".to_string(),
            parent_file: "specimen.txt".to_string(),
            parent_fields: fields,
            optionals,
            bidirectional,
        }
    }

    fn digest(rows: &[&[&str]]) -> KeyDigest {
        let mut digest = KeyDigest::new();
        for (i, row) in rows.iter().enumerate() {
            let indices: Vec<usize> = (0..row.len()).collect();
            digest.observe(row, &indices, i as u64 + 2);
        }
        digest
    }

    #[test]
    fn test_orphan_child_reported() {
        let parent = digest(&[&["D1"], &["D2"]]);
        let child = digest(&[&["D1"], &["D3"], &["D3"]]);
        let errors = join(vec![], false, 1).run(&child, &parent, &ValueConventions::default());

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.error_type == ErrorType::RelationValueError));
        assert_eq!(errors[0].line_number, Some(3));
        assert_eq!(errors[0].value, "[D3]");
    }

    #[test]
    fn test_bidirectional_reports_unreferenced_parent() {
        let parent = digest(&[&["D1"], &["D2"]]);
        let child = digest(&[&["D1"]]);
        let errors = join(vec![], true, 1).run(&child, &parent, &ValueConventions::default());

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::RelationParentValueError);
        assert_eq!(errors[0].file_name, "specimen.txt");
        assert_eq!(errors[0].line_number, Some(3));
    }

    #[test]
    fn test_optional_field_absent_matches_required_projection() {
        let parent = digest(&[&["D1", "S1"]]);
        let child = digest(&[&["D1", ""], &["D1", "S9"], &["D2", ""]]);
        let errors = join(vec![1], false, 2).run(&child, &parent, &ValueConventions::default());

        let lines: Vec<_> = errors.iter().map(|e| e.line_number.unwrap()).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_missing_required_key_skipped() {
        let parent = digest(&[&["D1"]]);
        let child = digest(&[&[""], &["-888"]]);
        assert!(join(vec![], false, 1)
            .run(&child, &parent, &ValueConventions::default())
            .is_empty());
    }
}
