//! Planner error types
//!
//! Error codes:
//! - PLAN_UNKNOWN_DATA_TYPE (REJECT)
//! - PLAN_INVALID_SCRIPT (REJECT)
//! - PLAN_UNKNOWN_CODELIST (REJECT)
//! - PLAN_UNKNOWN_FIELD (REJECT)
//! - PLAN_INVALID_DICTIONARY (REJECT)
//!
//! Planner errors are configuration errors. They surface before any
//! submission row is read and abort the run.

use std::fmt;

use crate::dictionary::DictionaryError;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Plan rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Selected data type is not a dictionary file schema
    PlanUnknownDataType,
    /// Script does not compile or is provably not boolean
    PlanInvalidScript,
    /// Code list restriction names an unknown list
    PlanUnknownCodelist,
    /// Relation or key names a field the schema lacks
    PlanUnknownField,
    /// Dictionary failed an authoring check while planning
    PlanInvalidDictionary,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::PlanUnknownDataType => "PLAN_UNKNOWN_DATA_TYPE",
            PlannerErrorCode::PlanInvalidScript => "PLAN_INVALID_SCRIPT",
            PlannerErrorCode::PlanUnknownCodelist => "PLAN_UNKNOWN_CODELIST",
            PlannerErrorCode::PlanUnknownField => "PLAN_UNKNOWN_FIELD",
            PlannerErrorCode::PlanInvalidDictionary => "PLAN_INVALID_DICTIONARY",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// File schema if applicable
    schema: Option<String>,
    /// Field name if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create an unknown data type error
    pub fn unknown_data_type(data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            code: PlannerErrorCode::PlanUnknownDataType,
            message: format!("Data type '{}' is not declared in the dictionary", data_type),
            schema: Some(data_type),
            field: None,
        }
    }

    /// Create an invalid script error
    pub fn invalid_script(
        schema: impl Into<String>,
        field: impl Into<String>,
        script: &str,
        reason: impl fmt::Display,
    ) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: PlannerErrorCode::PlanInvalidScript,
            message: format!(
                "Script '{}' on '{}.{}' is invalid: {}",
                script, schema, field, reason
            ),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// Create an unknown code list error
    pub fn unknown_codelist(schema: impl Into<String>, field: impl Into<String>, codelist: &str) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: PlannerErrorCode::PlanUnknownCodelist,
            message: format!("Field '{}.{}' references unknown code list '{}'", schema, field, codelist),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self {
            code: PlannerErrorCode::PlanUnknownField,
            message: format!("Schema '{}' has no field '{}'", schema, field),
            schema: Some(schema),
            field: Some(field),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
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

    /// Returns the file schema if applicable
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl From<DictionaryError> for PlannerError {
    fn from(err: DictionaryError) -> Self {
        Self {
            code: PlannerErrorCode::PlanInvalidDictionary,
            message: err.to_string(),
            schema: err.schema().map(str::to_string),
            field: err.field().map(str::to_string),
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
