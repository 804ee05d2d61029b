//! Plan data model
//!
//! A `Plan` is the compiled, per-project execution description. It owns one
//! `FileFlowPlanner` per selected file schema with a matching file, plus the
//! relation joins linking them. Plans are immutable once built.

use std::collections::BTreeSet;

use crate::dictionary::SummaryType;
use crate::restriction::{RelationJoin, RowCheck};

/// Data types selected for validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataTypeSelection {
    /// Every file schema of the dictionary
    #[default]
    All,
    /// Only the named file schemas, plus the targets of their relations
    Only(BTreeSet<String>),
}

impl DataTypeSelection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataTypeSelection::Only(names.into_iter().map(Into::into).collect())
    }
}

/// Statistics collected for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryElement {
    pub field_index: usize,
    pub field_name: String,
    pub summary_type: Option<SummaryType>,
}

/// Candidate key whose composite values must be unique in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKeyElement {
    pub field_indices: Vec<usize>,
    pub field_names: Vec<String>,
}

/// Where the errors of an invalid row go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTap {
    /// Attach the row's errors to the report
    ReportErrors,
    /// Count the row in the file's invalid-row tally
    CountInvalidRows,
}

/// Side of a relation a file plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySide {
    Child,
    Parent,
}

/// Key columns to project out of a file for one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyProjection {
    /// Index into `Plan::relations`
    pub relation: usize,
    pub side: KeySide,
    pub field_indices: Vec<usize>,
}

/// Kind of reference whose file is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// This file relates to a schema with no file
    RelationTarget,
    /// A bidirectional relation from a schema with no file points here
    ReverseRelation,
}

/// Reference from or to a schema that has no file in the submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    pub kind: ReferenceKind,
    pub schema: String,
    pub fields: Vec<String>,
}

/// Execution description for one file schema
#[derive(Debug)]
pub struct FileFlowPlanner {
    pub schema_name: String,
    /// Matching files, sorted. More than one is a collision.
    pub files: Vec<String>,
    /// Expected header
    pub field_names: Vec<String>,
    /// Fields carrying a required restriction, for the forbidden value scan
    pub required_fields: Vec<(usize, String)>,
    /// Row evaluators in execution order
    pub row_checks: Vec<RowCheck>,
    pub summaries: Vec<SummaryElement>,
    pub unique_keys: Vec<UniqueKeyElement>,
    pub error_taps: Vec<ErrorTap>,
    pub key_projections: Vec<KeyProjection>,
    pub missing_references: Vec<MissingReference>,
}

impl FileFlowPlanner {
    pub fn new(schema_name: impl Into<String>, files: Vec<String>, field_names: Vec<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            files,
            field_names,
            required_fields: Vec::new(),
            row_checks: Vec::new(),
            summaries: Vec::new(),
            unique_keys: Vec::new(),
            error_taps: Vec::new(),
            key_projections: Vec::new(),
            missing_references: Vec::new(),
        }
    }

    /// The file validated for this schema
    pub fn file_name(&self) -> &str {
        self.files.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_collision(&self) -> bool {
        self.files.len() > 1
    }
}

/// Relation between two planned files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPlan {
    pub join: RelationJoin,
}

/// Compiled per-project execution description
#[derive(Debug)]
pub struct Plan {
    pub project_key: String,
    pub dictionary_version: String,
    /// One flow per selected schema with a file, in dictionary order
    pub flows: Vec<FileFlowPlanner>,
    pub relations: Vec<RelationPlan>,
}

impl Plan {
    pub fn flow(&self, schema_name: &str) -> Option<&FileFlowPlanner> {
        self.flows.iter().find(|f| f.schema_name == schema_name)
    }

    pub fn flow_index(&self, schema_name: &str) -> Option<usize> {
        self.flows.iter().position(|f| f.schema_name == schema_name)
    }

    /// Files validated by this plan, in flow order
    pub fn file_names(&self) -> Vec<&str> {
        self.flows.iter().map(FileFlowPlanner::file_name).collect()
    }

    pub fn row_check_count(&self) -> usize {
        self.flows.iter().map(|f| f.row_checks.len()).sum()
    }
}
