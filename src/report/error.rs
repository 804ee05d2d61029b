//! Submitter-facing validation errors
//!
//! These are findings about the submitted data. They are accumulated in the
//! report and never abort a run, unlike `ValidationFailure`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Granularity of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLevel {
    FileLevel,
    RowLevel,
    CellLevel,
}

/// Broad family of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// File shape: codec, header, collisions, row layout
    Structural,
    /// A single cell failed a restriction
    Value,
    /// Cross-row or cross-file key constraint
    Relational,
}

/// Every kind of error the validator can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    StructurallyInvalidRowError,
    LineTerminatorMissingError,
    InvalidCharsetRowError,
    ForbiddenValueError,
    RelationValueError,
    RelationParentValueError,
    UniqueValueError,
    ValueTypeError,
    OutOfRangeError,
    MissingValueError,
    CodelistError,
    DiscreteValuesError,
    ScriptError,
    TooManyFilesError,
    RelationFileError,
    ReverseRelationFileError,
    UnsupportedCompressedFile,
    CompressionCodecError,
    DuplicateHeaderError,
    MissingRowsError,
    FileHeaderError,
}

impl ErrorType {
    /// Upper snake case name, as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::StructurallyInvalidRowError => "STRUCTURALLY_INVALID_ROW_ERROR",
            ErrorType::LineTerminatorMissingError => "LINE_TERMINATOR_MISSING_ERROR",
            ErrorType::InvalidCharsetRowError => "INVALID_CHARSET_ROW_ERROR",
            ErrorType::ForbiddenValueError => "FORBIDDEN_VALUE_ERROR",
            ErrorType::RelationValueError => "RELATION_VALUE_ERROR",
            ErrorType::RelationParentValueError => "RELATION_PARENT_VALUE_ERROR",
            ErrorType::UniqueValueError => "UNIQUE_VALUE_ERROR",
            ErrorType::ValueTypeError => "VALUE_TYPE_ERROR",
            ErrorType::OutOfRangeError => "OUT_OF_RANGE_ERROR",
            ErrorType::MissingValueError => "MISSING_VALUE_ERROR",
            ErrorType::CodelistError => "CODELIST_ERROR",
            ErrorType::DiscreteValuesError => "DISCRETE_VALUES_ERROR",
            ErrorType::ScriptError => "SCRIPT_ERROR",
            ErrorType::TooManyFilesError => "TOO_MANY_FILES_ERROR",
            ErrorType::RelationFileError => "RELATION_FILE_ERROR",
            ErrorType::ReverseRelationFileError => "REVERSE_RELATION_FILE_ERROR",
            ErrorType::UnsupportedCompressedFile => "UNSUPPORTED_COMPRESSED_FILE",
            ErrorType::CompressionCodecError => "COMPRESSION_CODEC_ERROR",
            ErrorType::DuplicateHeaderError => "DUPLICATE_HEADER_ERROR",
            ErrorType::MissingRowsError => "MISSING_ROWS_ERROR",
            ErrorType::FileHeaderError => "FILE_HEADER_ERROR",
        }
    }

    pub fn level(&self) -> ErrorLevel {
        match self {
            ErrorType::StructurallyInvalidRowError
            | ErrorType::LineTerminatorMissingError
            | ErrorType::InvalidCharsetRowError => ErrorLevel::RowLevel,
            ErrorType::TooManyFilesError
            | ErrorType::RelationFileError
            | ErrorType::ReverseRelationFileError
            | ErrorType::UnsupportedCompressedFile
            | ErrorType::CompressionCodecError
            | ErrorType::DuplicateHeaderError
            | ErrorType::MissingRowsError
            | ErrorType::FileHeaderError => ErrorLevel::FileLevel,
            _ => ErrorLevel::CellLevel,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorType::RelationValueError
            | ErrorType::RelationParentValueError
            | ErrorType::UniqueValueError
            | ErrorType::RelationFileError
            | ErrorType::ReverseRelationFileError => ErrorCategory::Relational,
            ErrorType::ForbiddenValueError
            | ErrorType::ValueTypeError
            | ErrorType::OutOfRangeError
            | ErrorType::MissingValueError
            | ErrorType::CodelistError
            | ErrorType::DiscreteValuesError
            | ErrorType::ScriptError => ErrorCategory::Value,
            _ => ErrorCategory::Structural,
        }
    }

    /// Row-shape errors exclude the row from value checks
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ErrorType::StructurallyInvalidRowError
                | ErrorType::LineTerminatorMissingError
                | ErrorType::InvalidCharsetRowError
        )
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of error parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorParameterKey {
    Expected,
    Min,
    Max,
    Schema,
    Files,
    Fields,
    OtherSchema,
    OtherFields,
    Value,
}

/// One named parameter of an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorParam {
    pub key: ErrorParameterKey,
    pub value: Value,
}

/// A single reported error
///
/// File-level errors carry no line number. Row and cell errors carry the
/// 1-based physical line, the header being line 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub file_name: String,
    pub field_names: Vec<String>,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Ordinal of the restriction among those of its kind on the field
    pub number: u32,
    pub line_number: Option<u64>,
    pub value: String,
    pub params: Vec<ErrorParam>,
}

impl ValidationError {
    /// Create an error with no fields, line or value
    pub fn new(file_name: impl Into<String>, error_type: ErrorType) -> Self {
        Self {
            file_name: file_name.into(),
            field_names: Vec::new(),
            error_type,
            number: 0,
            line_number: None,
            value: String::new(),
            params: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field_names.push(field.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line_number = Some(line);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    pub fn with_param(mut self, key: ErrorParameterKey, value: impl Into<Value>) -> Self {
        self.params.push(ErrorParam {
            key,
            value: value.into(),
        });
        self
    }

    /// Looks up a parameter by key
    pub fn param(&self, key: ErrorParameterKey) -> Option<&Value> {
        self.params.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    pub fn level(&self) -> ErrorLevel {
        self.error_type.level()
    }

    /// Human readable description
    pub fn message(&self) -> String {
        let fields = self.field_names.join(", ");
        let param = |key| self.param(key).map(render_value).unwrap_or_default();

        match self.error_type {
            ErrorType::StructurallyInvalidRowError => format!(
                "Structurally invalid row: {} columns against {} declared in the header",
                self.value,
                param(ErrorParameterKey::Expected)
            ),
            ErrorType::LineTerminatorMissingError => {
                "Row is missing line terminator. Expected \\n".to_string()
            }
            ErrorType::InvalidCharsetRowError => "Row contains invalid charset".to_string(),
            ErrorType::ForbiddenValueError => format!(
                "Invalid value ({}) for field {}. Cannot use forbidden value: {}",
                self.value,
                fields,
                param(ErrorParameterKey::Value)
            ),
            ErrorType::RelationValueError => format!(
                "Invalid value(s) ({}) for field(s) {}. Expected to match value(s) in: {}.{}",
                self.value,
                fields,
                param(ErrorParameterKey::OtherSchema),
                param(ErrorParameterKey::OtherFields)
            ),
            ErrorType::RelationParentValueError => format!(
                "No corresponding values in {}.{} for value(s) {} in {}",
                param(ErrorParameterKey::OtherSchema),
                param(ErrorParameterKey::OtherFields),
                self.value,
                fields
            ),
            ErrorType::UniqueValueError => format!(
                "Invalid set of values ({}) for fields {}. Expected to be unique",
                self.value, fields
            ),
            ErrorType::ValueTypeError => format!(
                "Invalid value ({}) for field {}. Expected type is: {}",
                self.value,
                fields,
                param(ErrorParameterKey::Expected)
            ),
            ErrorType::OutOfRangeError => format!(
                "Number {} is out of range for field {}. Expected value between {} and {}",
                self.value,
                fields,
                param(ErrorParameterKey::Min),
                param(ErrorParameterKey::Max)
            ),
            ErrorType::MissingValueError => {
                format!("Value missing for required field: {}", fields)
            }
            ErrorType::CodelistError => format!(
                "Invalid value {} for field {}. Expected code or value from code list {}",
                self.value,
                fields,
                param(ErrorParameterKey::Expected)
            ),
            ErrorType::DiscreteValuesError => format!(
                "Invalid value {} for field {}. Expected one of the following values: {}",
                self.value,
                fields,
                param(ErrorParameterKey::Expected)
            ),
            ErrorType::ScriptError => format!(
                "Invalid value {} for field {}. Expected to pass script: {}",
                self.value,
                fields,
                param(ErrorParameterKey::Expected)
            ),
            ErrorType::TooManyFilesError => format!(
                "More than one file matches the schema pattern of {}: {}",
                param(ErrorParameterKey::Schema),
                param(ErrorParameterKey::Files)
            ),
            ErrorType::RelationFileError => format!(
                "Relation to schema {} has no matching file",
                param(ErrorParameterKey::Schema)
            ),
            ErrorType::ReverseRelationFileError => format!(
                "Relation from schema {} has no matching file and this relation imposes that there be one",
                param(ErrorParameterKey::Schema)
            ),
            ErrorType::UnsupportedCompressedFile => {
                "The compressed file is concatenated or its block header is corrupted".to_string()
            }
            ErrorType::CompressionCodecError => {
                "File compression type does not match file extension".to_string()
            }
            ErrorType::DuplicateHeaderError => format!(
                "Duplicate header found: {}",
                param(ErrorParameterKey::Fields)
            ),
            ErrorType::MissingRowsError => format!("No rows found: {}", self.file_name),
            ErrorType::FileHeaderError => format!(
                "File header error: expected {} but found {}",
                param(ErrorParameterKey::Expected),
                param(ErrorParameterKey::Value)
            ),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "[{}] {}:{}: {}", self.error_type, self.file_name, line, self.message()),
            None => write!(f, "[{}] {}: {}", self.error_type, self.file_name, self.message()),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
