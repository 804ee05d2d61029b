//! Explain plan output
//!
//! Produces deterministic, human-readable and JSON descriptions of a plan.

use std::fmt;

use serde::Serialize;

use super::errors::PlannerError;
use super::plan::{Plan, ReferenceKind};

/// Description of one planned file
#[derive(Debug, Clone, Serialize)]
pub struct ExplainFlow {
    pub schema: String,
    pub files: Vec<String>,
    pub row_checks: Vec<String>,
    pub unique_keys: Vec<Vec<String>>,
    pub summaries: Vec<String>,
    pub missing_references: Vec<String>,
}

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    pub project: Option<String>,
    pub dictionary_version: Option<String>,
    pub flows: Vec<ExplainFlow>,
    pub relations: Vec<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful plan
    pub fn from_plan(plan: &Plan) -> Self {
        let flows = plan
            .flows
            .iter()
            .map(|flow| ExplainFlow {
                schema: flow.schema_name.clone(),
                files: flow.files.clone(),
                row_checks: flow
                    .row_checks
                    .iter()
                    .map(|check| format!("{}: {}", check.field_name(), check.describe()))
                    .collect(),
                unique_keys: flow.unique_keys.iter().map(|k| k.field_names.clone()).collect(),
                summaries: flow
                    .summaries
                    .iter()
                    .map(|s| match s.summary_type {
                        Some(t) => format!("{}: {:?}", s.field_name, t),
                        None => format!("{}: completeness", s.field_name),
                    })
                    .collect(),
                missing_references: flow
                    .missing_references
                    .iter()
                    .map(|r| match r.kind {
                        ReferenceKind::RelationTarget => format!("relation target '{}' has no file", r.schema),
                        ReferenceKind::ReverseRelation => format!("reverse relation from '{}' has no file", r.schema),
                    })
                    .collect(),
            })
            .collect();

        let relations = plan
            .relations
            .iter()
            .map(|r| {
                let join = &r.join;
                format!(
                    "{}[{}] -> {}[{}]{}",
                    join.child_file,
                    join.child_fields.join(", "),
                    join.parent_file,
                    join.parent_fields.join(", "),
                    if join.bidirectional { " (bidirectional)" } else { "" }
                )
            })
            .collect();

        Self {
            accepted: true,
            project: Some(plan.project_key.clone()),
            dictionary_version: Some(plan.dictionary_version.clone()),
            flows,
            relations,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            project: None,
            dictionary_version: None,
            flows: Vec::new(),
            relations: Vec::new(),
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(project) = &self.project {
                writeln!(f, "Project: {}", project)?;
            }
            if let Some(version) = &self.dictionary_version {
                writeln!(f, "Dictionary: {}", version)?;
            }
            for flow in &self.flows {
                writeln!(f, "File: {} ({})", flow.schema, flow.files.join(", "))?;
                for check in &flow.row_checks {
                    writeln!(f, "  - {}", check)?;
                }
                for key in &flow.unique_keys {
                    writeln!(f, "  - unique[{}]", key.join(", "))?;
                }
                for missing in &flow.missing_references {
                    writeln!(f, "  ! {}", missing)?;
                }
            }
            if !self.relations.is_empty() {
                writeln!(f, "Relations:")?;
                for relation in &self.relations {
                    writeln!(f, "  - {}", relation)?;
                }
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CodeLists, Dictionary, Field, FileSchema, Restriction};
    use crate::planner::{DataTypeSelection, Planner};

    fn plan() -> Plan {
        let dict = Dictionary::new("0.6c").with_file(
            FileSchema::new("donor", r"^donor\.txt$")
                .with_field(Field::text("donor_id").with_restriction(Restriction::required()))
                .with_unique_key(["donor_id"]),
        );
        Planner::new(&dict, &CodeLists::new())
            .plan("PROJ-CA", &DataTypeSelection::All, &["donor.txt".to_string()])
            .unwrap()
    }

    #[test]
    fn test_explain_accepted_plan() {
        let explain = ExplainPlan::from_plan(&plan());
        assert!(explain.accepted);
        assert_eq!(explain.flows[0].files, vec!["donor.txt".to_string()]);

        let output = explain.to_string();
        assert!(output.starts_with("=== EXPLAIN PLAN ==="));
        assert!(output.contains("ACCEPTED"));
        assert!(output.contains("unique[donor_id]"));
    }

    #[test]
    fn test_explain_rejected_plan() {
        let explain = ExplainPlan::from_error(&PlannerError::unknown_data_type("biomarker"));
        assert!(!explain.accepted);
        assert_eq!(explain.rejection_code, Some("PLAN_UNKNOWN_DATA_TYPE".into()));
        assert!(explain.to_string().contains("REJECTED"));
    }

    #[test]
    fn test_explain_deterministic() {
        let a = ExplainPlan::from_plan(&plan()).to_json().unwrap();
        let b = ExplainPlan::from_plan(&plan()).to_json().unwrap();
        assert_eq!(a, b);
    }
}
