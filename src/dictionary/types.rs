//! Dictionary type definitions
//!
//! A dictionary is the versioned description of every file a submission may
//! contain. It is loaded once per run and never mutated afterwards.
//!
//! Supported value types:
//! - TEXT: passthrough UTF-8
//! - INTEGER: 64-bit signed integer
//! - DECIMAL: 64-bit floating point
//! - DATETIME: declared but not parsed

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{DictionaryError, DictionaryResult};

/// Declared type of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    /// UTF-8 text, never coerced
    Text,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Decimal,
    /// Accepted in dictionaries, values are not parsed
    Datetime,
}

impl ValueType {
    /// Returns the type name used in error parameters
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Text => "TEXT",
            ValueType::Integer => "INTEGER",
            ValueType::Decimal => "DECIMAL",
            ValueType::Datetime => "DATETIME",
        }
    }

    /// Whether range restrictions and numeric summaries apply
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Decimal)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Statistics computed for a field in addition to completeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryType {
    /// Min, max, average and standard deviation
    Average,
    /// Min and max only
    MinMax,
    /// Count per distinct value
    Frequency,
    /// Number of distinct values
    UniqueCount,
}

/// Kind of a restriction, used for duplicate detection and error numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RestrictionKind {
    Required,
    Range,
    DiscreteValues,
    CodeList,
    Script,
}

impl RestrictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestrictionKind::Required => "required",
            RestrictionKind::Range => "range",
            RestrictionKind::DiscreteValues => "discrete_values",
            RestrictionKind::CodeList => "codelist",
            RestrictionKind::Script => "script",
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative per-field constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Restriction {
    /// Value must be present
    Required {
        /// Whether missing codes (e.g. "-888") satisfy the restriction
        #[serde(default)]
        accept_missing_code: bool,
    },
    /// Inclusive numeric bounds
    Range { min: f64, max: f64 },
    /// Value must be one of a fixed set
    DiscreteValues { values: Vec<String> },
    /// Value must be a code or value of the named code list
    Codelist { name: String },
    /// Boolean predicate over the row
    Script {
        script: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Restriction {
    /// Returns the restriction kind
    pub fn kind(&self) -> RestrictionKind {
        match self {
            Restriction::Required { .. } => RestrictionKind::Required,
            Restriction::Range { .. } => RestrictionKind::Range,
            Restriction::DiscreteValues { .. } => RestrictionKind::DiscreteValues,
            Restriction::Codelist { .. } => RestrictionKind::CodeList,
            Restriction::Script { .. } => RestrictionKind::Script,
        }
    }

    /// Create a required restriction that rejects missing codes
    pub fn required() -> Self {
        Restriction::Required {
            accept_missing_code: false,
        }
    }

    /// Create a range restriction
    pub fn range(min: f64, max: f64) -> Self {
        Restriction::Range { min, max }
    }

    /// Create a discrete values restriction
    pub fn discrete_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Restriction::DiscreteValues {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a code list restriction
    pub fn codelist(name: impl Into<String>) -> Self {
        Restriction::Codelist { name: name.into() }
    }

    /// Create a script restriction
    pub fn script(script: impl Into<String>) -> Self {
        Restriction::Script {
            script: script.into(),
            description: None,
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name, as it must appear in the header
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value_type: ValueType,
    /// Restrictions in evaluation order
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<SummaryType>,
}

impl Field {
    /// Create a field without restrictions
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            label: None,
            value_type,
            restrictions: Vec::new(),
            summary_type: None,
        }
    }

    /// Create a text field
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Text)
    }

    /// Create an integer field
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Integer)
    }

    /// Create a decimal field
    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Decimal)
    }

    /// Append a restriction
    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    /// Set the summary type
    pub fn with_summary(mut self, summary_type: SummaryType) -> Self {
        self.summary_type = Some(summary_type);
        self
    }

    /// Whether the field carries a required restriction
    pub fn is_required(&self) -> bool {
        self.restrictions
            .iter()
            .any(|r| r.kind() == RestrictionKind::Required)
    }
}

/// Foreign-key style link from one file schema to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Local (child) field names
    pub fields: Vec<String>,
    /// Target (parent) file schema name
    pub other: String,
    /// Target field names, same arity as `fields`
    pub other_fields: Vec<String>,
    /// Whether every parent key must also be referenced by a child
    #[serde(default)]
    pub bidirectional: bool,
    /// Indices into `fields` that only participate when populated
    #[serde(default)]
    pub optionals: Vec<usize>,
}

impl Relation {
    /// Create a unidirectional relation without optional fields
    pub fn new<I, J, S, T>(fields: I, other: impl Into<String>, other_fields: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            other: other.into(),
            other_fields: other_fields.into_iter().map(Into::into).collect(),
            bidirectional: false,
            optionals: Vec::new(),
        }
    }

    /// Mark the relation bidirectional
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    /// Set optional field indices
    pub fn with_optionals(mut self, optionals: Vec<usize>) -> Self {
        self.optionals = optionals;
        self
    }

    /// Short description for logs and error messages
    pub fn describe(&self) -> String {
        format!(
            "{:?} -> {}.{:?} (bidirectional: {}, optionals: {:?})",
            self.fields, self.other, self.other_fields, self.bidirectional, self.optionals
        )
    }
}

/// Schema for one logical file type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSchema {
    /// Unique schema name (e.g. "donor")
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Regular expression matched against submitted file names
    pub pattern: String,
    /// Fields in header order
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// Candidate keys whose composite values must be unique
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
}

impl FileSchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            pattern: pattern.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            unique_keys: Vec::new(),
        }
    }

    /// Append a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a relation
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Append a unique key
    pub fn with_unique_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys
            .push(key.into_iter().map(Into::into).collect());
        self
    }

    /// Field names in declared order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in the header
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Compiles the file name pattern
    pub fn compile_pattern(&self) -> DictionaryResult<Regex> {
        Regex::new(&self.pattern)
            .map_err(|e| DictionaryError::invalid_pattern(&self.name, &self.pattern, e.to_string()))
    }
}

/// Versioned dictionary of file schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File schemas in declared order
    #[serde(default)]
    pub files: Vec<FileSchema>,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: None,
            files: Vec::new(),
        }
    }

    /// Append a file schema
    pub fn with_file(mut self, schema: FileSchema) -> Self {
        self.files.push(schema);
        self
    }

    /// Looks up a file schema by name
    pub fn file_schema(&self, name: &str) -> Option<&FileSchema> {
        self.files.iter().find(|s| s.name == name)
    }

    /// File schema names in declared order
    pub fn file_schema_names(&self) -> Vec<&str> {
        self.files.iter().map(|s| s.name.as_str()).collect()
    }

    /// Schemas holding a bidirectional relation to `parent`
    pub fn bidirectional_children(&self, parent: &str) -> Vec<&FileSchema> {
        self.files
            .iter()
            .filter(|s| {
                s.relations
                    .iter()
                    .any(|r| r.bidirectional && r.other == parent)
            })
            .collect()
    }
}
