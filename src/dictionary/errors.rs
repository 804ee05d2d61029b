//! Dictionary error types
//!
//! Error codes:
//! - DICT_MALFORMED (FATAL)
//! - DICT_IO (FATAL)
//! - DICT_DUPLICATE_SCHEMA (REJECT)
//! - DICT_DUPLICATE_FIELD (REJECT)
//! - DICT_INVALID_PATTERN (REJECT)
//! - DICT_DUPLICATE_RESTRICTION (REJECT)
//! - DICT_INVALID_RESTRICTION (REJECT)
//! - DICT_UNKNOWN_CODELIST (REJECT)
//! - DICT_INVALID_CODELIST (REJECT)
//! - DICT_INVALID_RELATION (REJECT)
//! - DICT_INVALID_UNIQUE_KEY (REJECT)
//!
//! Every dictionary error is a configuration error: it is raised before any
//! submission row is read.

use std::fmt;

/// Severity levels for dictionary errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Dictionary rejected, the run cannot start
    Reject,
    /// Dictionary could not be read at all
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Dictionary-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryErrorCode {
    /// Dictionary or code list JSON does not parse
    DictMalformed,
    /// Dictionary or code list file cannot be read
    DictIo,
    /// Two file schemas share a name
    DictDuplicateSchema,
    /// Two fields of one schema share a name
    DictDuplicateField,
    /// File name pattern is not a valid regular expression
    DictInvalidPattern,
    /// A field declares the same restriction kind twice
    DictDuplicateRestriction,
    /// Restriction parameters are inconsistent with the field
    DictInvalidRestriction,
    /// Code list restriction names an unknown list
    DictUnknownCodelist,
    /// Code list terms collide
    DictInvalidCodelist,
    /// Relation is malformed or dangling
    DictInvalidRelation,
    /// Unique key is empty or names unknown fields
    DictInvalidUniqueKey,
}

impl DictionaryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            DictionaryErrorCode::DictMalformed => "DICT_MALFORMED",
            DictionaryErrorCode::DictIo => "DICT_IO",
            DictionaryErrorCode::DictDuplicateSchema => "DICT_DUPLICATE_SCHEMA",
            DictionaryErrorCode::DictDuplicateField => "DICT_DUPLICATE_FIELD",
            DictionaryErrorCode::DictInvalidPattern => "DICT_INVALID_PATTERN",
            DictionaryErrorCode::DictDuplicateRestriction => "DICT_DUPLICATE_RESTRICTION",
            DictionaryErrorCode::DictInvalidRestriction => "DICT_INVALID_RESTRICTION",
            DictionaryErrorCode::DictUnknownCodelist => "DICT_UNKNOWN_CODELIST",
            DictionaryErrorCode::DictInvalidCodelist => "DICT_INVALID_CODELIST",
            DictionaryErrorCode::DictInvalidRelation => "DICT_INVALID_RELATION",
            DictionaryErrorCode::DictInvalidUniqueKey => "DICT_INVALID_UNIQUE_KEY",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            DictionaryErrorCode::DictMalformed | DictionaryErrorCode::DictIo => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for DictionaryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Dictionary error with the offending schema and field, when known
#[derive(Debug)]
pub struct DictionaryError {
    code: DictionaryErrorCode,
    message: String,
    schema: Option<String>,
    field: Option<String>,
}

impl DictionaryError {
    fn new(code: DictionaryErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            schema: None,
            field: None,
        }
    }

    fn in_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    fn on_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    /// Create an error for a file that does not parse
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictMalformed,
            format!("Malformed dictionary file '{}': {}", path.into(), reason.into()),
        )
    }

    /// Create an error for a file that cannot be read
    pub fn io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictIo,
            format!("Cannot read '{}': {}", path.into(), reason.into()),
        )
    }

    pub fn duplicate_schema(schema: &str) -> Self {
        Self::new(
            DictionaryErrorCode::DictDuplicateSchema,
            format!("File schema '{}' is declared more than once", schema),
        )
        .in_schema(schema)
    }

    pub fn duplicate_field(schema: &str, field: &str) -> Self {
        Self::new(
            DictionaryErrorCode::DictDuplicateField,
            format!("Field '{}' is declared more than once in '{}'", field, schema),
        )
        .in_schema(schema)
        .on_field(field)
    }

    pub fn invalid_pattern(schema: &str, pattern: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictInvalidPattern,
            format!(
                "Pattern '{}' of '{}' is not a valid regular expression: {}",
                pattern,
                schema,
                reason.into()
            ),
        )
        .in_schema(schema)
    }

    pub fn duplicate_restriction(schema: &str, field: &str, kind: &str) -> Self {
        Self::new(
            DictionaryErrorCode::DictDuplicateRestriction,
            format!("Field '{}.{}' declares more than one {} restriction", schema, field, kind),
        )
        .in_schema(schema)
        .on_field(field)
    }

    pub fn invalid_restriction(schema: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictInvalidRestriction,
            format!("Invalid restriction on '{}.{}': {}", schema, field, reason.into()),
        )
        .in_schema(schema)
        .on_field(field)
    }

    pub fn unknown_codelist(schema: &str, field: &str, codelist: &str) -> Self {
        Self::new(
            DictionaryErrorCode::DictUnknownCodelist,
            format!("Field '{}.{}' references unknown code list '{}'", schema, field, codelist),
        )
        .in_schema(schema)
        .on_field(field)
    }

    pub fn invalid_codelist(codelist: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictInvalidCodelist,
            format!("Code list '{}' is invalid: {}", codelist, reason.into()),
        )
    }

    pub fn invalid_relation(schema: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictInvalidRelation,
            format!("Invalid relation in '{}': {}", schema, reason.into()),
        )
        .in_schema(schema)
    }

    pub fn invalid_unique_key(schema: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DictionaryErrorCode::DictInvalidUniqueKey,
            format!("Invalid unique key in '{}': {}", schema, reason.into()),
        )
        .in_schema(schema)
    }

    /// Returns the error code
    pub fn code(&self) -> DictionaryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending file schema, if known
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the offending field, if known
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for DictionaryError {}

/// Result type for dictionary operations
pub type DictionaryResult<T> = Result<T, DictionaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DictionaryErrorCode::DictMalformed.code(), "DICT_MALFORMED");
        assert_eq!(DictionaryErrorCode::DictInvalidRelation.code(), "DICT_INVALID_RELATION");
        assert_eq!(
            DictionaryErrorCode::DictDuplicateRestriction.code(),
            "DICT_DUPLICATE_RESTRICTION"
        );
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(DictionaryErrorCode::DictMalformed.severity(), Severity::Fatal);
        assert_eq!(DictionaryErrorCode::DictIo.severity(), Severity::Fatal);
        assert_eq!(DictionaryErrorCode::DictInvalidRelation.severity(), Severity::Reject);
    }

    #[test]
    fn test_error_context() {
        let err = DictionaryError::unknown_codelist("donor", "donor_sex", "GLOBAL.0.sex.v1");
        assert_eq!(err.schema(), Some("donor"));
        assert_eq!(err.field(), Some("donor_sex"));
        let display = err.to_string();
        assert!(display.contains("DICT_UNKNOWN_CODELIST"));
        assert!(display.contains("GLOBAL.0.sex.v1"));
    }
}
