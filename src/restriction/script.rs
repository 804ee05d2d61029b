//! Script restrictions
//!
//! Scripts are boolean expressions over the row, compiled once per plan.
//! Variables are the row's field names plus `project`. Numeric fields are
//! bound to their coerced values, missing cells to the empty value and every
//! other cell to its text.

use evalexpr::{
    build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Operator, Value,
};
use thiserror::Error;

use crate::report::{ErrorParameterKey, ErrorType, TupleError, TupleState};

use super::{Row, TypedValue};

/// Variable bound to the project key
pub const PROJECT_VARIABLE: &str = "project";

/// Reasons a script cannot be compiled
#[derive(Debug, Error, PartialEq)]
pub enum ScriptCompileError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("script returns {0}, expected a boolean")]
    NotBoolean(&'static str),

    #[error("script assigns to variable '{0}'")]
    Assignment(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

/// Return type of an expression as far as it can be known before evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticType {
    Boolean,
    Other(&'static str),
    Unknown,
}

fn static_type(node: &Node) -> StaticType {
    match node.operator() {
        Operator::RootNode | Operator::Chain => match node.children().last() {
            Some(child) => static_type(child),
            None => StaticType::Other("nothing"),
        },
        Operator::Eq
        | Operator::Neq
        | Operator::Gt
        | Operator::Lt
        | Operator::Geq
        | Operator::Leq
        | Operator::And
        | Operator::Or
        | Operator::Not => StaticType::Boolean,
        Operator::Add
        | Operator::Sub
        | Operator::Neg
        | Operator::Mul
        | Operator::Div
        | Operator::Mod
        | Operator::Exp => StaticType::Other("a number or string"),
        Operator::Tuple => StaticType::Other("a tuple"),
        Operator::Const { value } => match value {
            Value::Boolean(_) => StaticType::Boolean,
            other => StaticType::Other(type_name(other)),
        },
        _ => StaticType::Unknown,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "a string",
        Value::Float(_) => "a float",
        Value::Int(_) => "an integer",
        Value::Boolean(_) => "a boolean",
        Value::Tuple(_) => "a tuple",
        Value::Empty => "nothing",
    }
}

/// A compiled boolean expression
#[derive(Debug)]
pub struct ScriptPredicate {
    source: String,
    tree: Node,
    variables: Vec<String>,
}

impl ScriptPredicate {
    /// Compiles `source`, accepting only variables in `fields` or `project`.
    ///
    /// Scripts whose result is provably not boolean are rejected here.
    /// Results that cannot be typed statically are checked on evaluation.
    pub fn compile(source: &str, fields: &[String]) -> Result<Self, ScriptCompileError> {
        let tree = build_operator_tree(source).map_err(|e| ScriptCompileError::Syntax(e.to_string()))?;

        if let Some(name) = tree.iter_write_variable_identifiers().next() {
            return Err(ScriptCompileError::Assignment(name.to_string()));
        }

        let mut variables: Vec<String> = Vec::new();
        for name in tree.iter_variable_identifiers() {
            if name != PROJECT_VARIABLE && !fields.iter().any(|f| f == name) {
                return Err(ScriptCompileError::UnknownVariable(name.to_string()));
            }
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }

        if let StaticType::Other(found) = static_type(&tree) {
            return Err(ScriptCompileError::NotBoolean(found));
        }

        Ok(Self {
            source: source.to_string(),
            tree,
            variables,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Referenced variables, in order of first appearance
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates the predicate with the given bindings
    pub fn evaluate(&self, bindings: &[(String, Value)]) -> Result<bool, String> {
        let mut context = HashMapContext::new();
        for (name, value) in bindings {
            context
                .set_value(name.clone(), value.clone())
                .map_err(|e| e.to_string())?;
        }

        match self.tree.eval_with_context(&context) {
            Ok(Value::Boolean(result)) => Ok(result),
            Ok(other) => Err(format!("script returned {} ({})", type_name(&other), other)),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Script restriction attached to a field
#[derive(Debug)]
pub struct ScriptCheck {
    pub field_index: usize,
    pub field_name: String,
    pub predicate: ScriptPredicate,
    pub description: Option<String>,
    pub number: u32,
}

impl ScriptCheck {
    fn bindings(&self, row: &Row<'_>) -> Vec<(String, Value)> {
        self.predicate
            .variables()
            .iter()
            .map(|name| {
                let value = if name == PROJECT_VARIABLE && row.field_index(name).is_none() {
                    Value::String(row.project_key().to_string())
                } else {
                    match row.field_index(name) {
                        Some(index) => bind(row, index),
                        None => Value::Empty,
                    }
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Runs on every row, including rows where the field itself is missing,
    /// so scripts can express conditional requirements.
    pub fn evaluate(&self, row: &mut Row<'_>, state: &mut TupleState) {
        let bindings = self.bindings(row);
        let failure = match self.predicate.evaluate(&bindings) {
            Ok(true) => return,
            Ok(false) => render_bindings(&bindings),
            Err(reason) => format!(
                "Error invoking script restriction: '{}', arguments: '{}'",
                reason,
                render_bindings(&bindings)
            ),
        };

        state.report(
            TupleError::new(ErrorType::ScriptError, &self.field_name, failure)
                .with_number(self.number)
                .with_param(
                    ErrorParameterKey::Expected,
                    self.description
                        .clone()
                        .unwrap_or_else(|| self.predicate.source().to_string()),
                ),
        );
    }
}

fn bind(row: &Row<'_>, index: usize) -> Value {
    match row.typed(index) {
        TypedValue::Integer(i) => Value::Int(i),
        TypedValue::Decimal(d) => Value::Float(d),
        TypedValue::Missing => Value::Empty,
        TypedValue::Raw | TypedValue::Invalid => {
            let cell = row.cell(index);
            if row.conventions().is_missing(cell) {
                Value::Empty
            } else {
                Value::String(cell.to_string())
            }
        }
    }
}

fn render_bindings(bindings: &[(String, Value)]) -> String {
    bindings
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::ValueType;
    use crate::restriction::testing::RowFixture;
    use crate::restriction::{RowCheck, ValueTypeCheck};

    fn fields() -> Vec<String> {
        vec!["age".to_string(), "interval".to_string(), "notes".to_string()]
    }

    fn checks(script: &str) -> Vec<RowCheck> {
        let predicate = ScriptPredicate::compile(script, &fields()).unwrap();
        vec![
            RowCheck::ValueType(ValueTypeCheck {
                field_index: 0,
                field_name: "age".to_string(),
                value_type: ValueType::Integer,
            }),
            RowCheck::ValueType(ValueTypeCheck {
                field_index: 1,
                field_name: "interval".to_string(),
                value_type: ValueType::Integer,
            }),
            RowCheck::Script(ScriptCheck {
                field_index: 1,
                field_name: "interval".to_string(),
                predicate,
                description: None,
                number: 0,
            }),
        ]
    }

    #[test]
    fn test_non_boolean_rejected_at_compile() {
        let err = ScriptPredicate::compile("age + 1", &fields()).unwrap_err();
        assert!(matches!(err, ScriptCompileError::NotBoolean(_)));
        assert!(matches!(
            ScriptPredicate::compile("\"text\"", &fields()),
            Err(ScriptCompileError::NotBoolean(_))
        ));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            ScriptPredicate::compile("age > (", &fields()),
            Err(ScriptCompileError::Syntax(_))
        ));
        assert_eq!(
            ScriptPredicate::compile("weight > 3", &fields()).unwrap_err(),
            ScriptCompileError::UnknownVariable("weight".to_string())
        );
        assert!(matches!(
            ScriptPredicate::compile("age = 3; true", &fields()),
            Err(ScriptCompileError::Assignment(_))
        ));
    }

    #[test]
    fn test_variables_deduplicated_in_order() {
        let predicate = ScriptPredicate::compile("interval > age && age > 0", &fields()).unwrap();
        assert_eq!(predicate.variables(), &["interval".to_string(), "age".to_string()]);
    }

    #[test]
    fn test_unknown_type_accepted_at_compile() {
        assert!(ScriptPredicate::compile("notes", &fields()).is_ok());
    }

    #[test]
    fn test_passing_row() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "100", ""])
            .run(&checks("interval > age"));
        assert!(state.is_valid());
    }

    #[test]
    fn test_failing_row_reports_bindings() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "10", "x"])
            .run(&checks("interval > age"));
        let error = &state.errors()[0];
        assert_eq!(error.error_type, ErrorType::ScriptError);
        assert_eq!(error.value, "interval = 10, age = 40");
    }

    #[test]
    fn test_runtime_non_boolean_is_reported() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "10", "x"])
            .run(&checks("notes"));
        assert_eq!(
            state.errors()[0].value,
            "Error invoking script restriction: 'script returned a string (\"x\")', arguments: 'notes = \"x\"'"
        );
    }

    #[test]
    fn test_evaluation_error_reports_referenced_bindings_only() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "5", "alive"])
            .run(&checks("interval > notes"));
        let value = &state.errors()[0].value;
        assert!(value.starts_with("Error invoking script restriction: '"));
        assert!(value.ends_with(", arguments: 'interval = 5, notes = \"alive\"'"));
        assert!(!value.contains("age ="));
    }

    #[test]
    fn test_project_variable() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "10", ""])
            .run(&checks("project == \"PROJ-CA\""));
        assert!(state.is_valid());
    }

    #[test]
    fn test_conditional_requirement_fires_on_missing_field() {
        let script = "notes != \"deceased\" || interval != ()";

        let alive = RowFixture::new(&["age", "interval", "notes"], &["40", "", "alive"]).run(&checks(script));
        assert!(alive.is_valid());

        let deceased = RowFixture::new(&["age", "interval", "notes"], &["40", "", "deceased"]).run(&checks(script));
        let error = &deceased.errors()[0];
        assert_eq!(error.error_type, ErrorType::ScriptError);
        assert_eq!(error.value, "notes = \"deceased\", interval = ()");
    }

    #[test]
    fn test_missing_code_binds_as_empty() {
        let state = RowFixture::new(&["age", "interval", "notes"], &["40", "-888", ""])
            .run(&checks("interval > age"));
        let error = &state.errors()[0];
        assert_eq!(error.error_type, ErrorType::ScriptError);
        assert!(error.value.starts_with("Error invoking script restriction: '"));
        assert!(error.value.ends_with("arguments: 'interval = (), age = 40'"));
    }
}
