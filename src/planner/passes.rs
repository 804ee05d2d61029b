//! Compilation passes
//!
//! Each pass walks the schema of one file and contributes elements to its
//! flow. Passes run in a fixed order:
//!
//! 1. value type coercion, which must precede range checks
//! 2. the remaining field restrictions, in declared order
//! 3. unique keys
//! 4. summaries, for every field
//! 5. error taps on the invalid row stream
//! 6. relations, linked once every flow exists

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::dictionary::{CodeLists, Dictionary, FileSchema, Restriction, RestrictionKind};
use crate::restriction::{
    CodeListCheck, DiscreteValuesCheck, RangeCheck, RelationJoin, RequiredCheck, RowCheck,
    ScriptCheck, ScriptPredicate, ValueTypeCheck,
};

use super::errors::{PlannerError, PlannerResult};
use super::plan::{
    ErrorTap, FileFlowPlanner, KeyProjection, KeySide, MissingReference, Plan, ReferenceKind,
    RelationPlan, SummaryElement, UniqueKeyElement,
};

/// One step of plan compilation
pub trait PlanningPass {
    fn name(&self) -> &'static str;

    /// Contributes elements to the flow of one file
    fn plan_file(&mut self, _schema: &FileSchema, _flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        Ok(())
    }

    /// Runs once all flows are built
    fn link(&mut self, _dictionary: &Dictionary, _selected: &BTreeSet<String>, _plan: &mut Plan) -> PlannerResult<()> {
        Ok(())
    }
}

/// The passes in execution order
pub fn default_passes(codelists: &CodeLists) -> Vec<Box<dyn PlanningPass + '_>> {
    vec![
        Box::new(ValueTypePass),
        Box::new(RestrictionPass::new(codelists)),
        Box::new(UniqueKeyPass),
        Box::new(SummaryPass),
        Box::new(ErrorTapPass),
        Box::new(RelationPass),
    ]
}

pub struct ValueTypePass;

impl PlanningPass for ValueTypePass {
    fn name(&self) -> &'static str {
        "value_type"
    }

    fn plan_file(&mut self, schema: &FileSchema, flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        for (index, field) in schema.fields.iter().enumerate() {
            flow.row_checks.push(RowCheck::ValueType(ValueTypeCheck {
                field_index: index,
                field_name: field.name.clone(),
                value_type: field.value_type,
            }));
        }
        Ok(())
    }
}

/// Compiles Required, Range, DiscreteValues, CodeList and Script.
///
/// Code list value sets are built once per list and shared between every
/// field that references it.
pub struct RestrictionPass<'a> {
    codelists: &'a CodeLists,
    accepted: HashMap<String, Arc<HashSet<String>>>,
}

impl<'a> RestrictionPass<'a> {
    pub fn new(codelists: &'a CodeLists) -> Self {
        Self {
            codelists,
            accepted: HashMap::new(),
        }
    }

    fn accepted_values(&mut self, schema: &str, field: &str, name: &str) -> PlannerResult<Arc<HashSet<String>>> {
        if let Some(values) = self.accepted.get(name) {
            return Ok(Arc::clone(values));
        }
        let list = self
            .codelists
            .get(name)
            .ok_or_else(|| PlannerError::unknown_codelist(schema, field, name))?;
        let values = Arc::new(list.accepted_values());
        self.accepted.insert(name.to_string(), Arc::clone(&values));
        Ok(values)
    }
}

impl PlanningPass for RestrictionPass<'_> {
    fn name(&self) -> &'static str {
        "restriction"
    }

    fn plan_file(&mut self, schema: &FileSchema, flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        let field_names = schema.field_names();

        for (index, field) in schema.fields.iter().enumerate() {
            let mut ordinals: HashMap<RestrictionKind, u32> = HashMap::new();

            for restriction in &field.restrictions {
                let ordinal = ordinals.entry(restriction.kind()).or_insert(0);
                let number = *ordinal;
                *ordinal += 1;

                let check = match restriction {
                    Restriction::Required { accept_missing_code } => {
                        if !flow.required_fields.iter().any(|(i, _)| *i == index) {
                            flow.required_fields.push((index, field.name.clone()));
                        }
                        RowCheck::Required(RequiredCheck {
                            field_index: index,
                            field_name: field.name.clone(),
                            accept_missing_code: *accept_missing_code,
                            number,
                        })
                    }
                    Restriction::Range { min, max } => RowCheck::Range(RangeCheck {
                        field_index: index,
                        field_name: field.name.clone(),
                        min: *min,
                        max: *max,
                        number,
                    }),
                    Restriction::DiscreteValues { values } => RowCheck::DiscreteValues(
                        DiscreteValuesCheck::new(index, field.name.clone(), values, number),
                    ),
                    Restriction::Codelist { name } => RowCheck::CodeList(CodeListCheck {
                        field_index: index,
                        field_name: field.name.clone(),
                        codelist: name.clone(),
                        accepted: self.accepted_values(&schema.name, &field.name, name)?,
                        number,
                    }),
                    Restriction::Script { script, description } => {
                        let predicate = ScriptPredicate::compile(script, &field_names).map_err(|e| {
                            PlannerError::invalid_script(&schema.name, &field.name, script, e)
                        })?;
                        RowCheck::Script(ScriptCheck {
                            field_index: index,
                            field_name: field.name.clone(),
                            predicate,
                            description: description.clone(),
                            number,
                        })
                    }
                };
                flow.row_checks.push(check);
            }
        }
        Ok(())
    }
}

pub struct UniqueKeyPass;

impl PlanningPass for UniqueKeyPass {
    fn name(&self) -> &'static str {
        "unique_key"
    }

    fn plan_file(&mut self, schema: &FileSchema, flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        for key in &schema.unique_keys {
            let field_indices = indices_of(schema, key)?;
            flow.unique_keys.push(UniqueKeyElement {
                field_indices,
                field_names: key.clone(),
            });
        }
        Ok(())
    }
}

pub struct SummaryPass;

impl PlanningPass for SummaryPass {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn plan_file(&mut self, schema: &FileSchema, flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        flow.summaries = schema
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| SummaryElement {
                field_index: index,
                field_name: field.name.clone(),
                summary_type: field.summary_type,
            })
            .collect();
        Ok(())
    }
}

pub struct ErrorTapPass;

impl PlanningPass for ErrorTapPass {
    fn name(&self) -> &'static str {
        "error_tap"
    }

    fn plan_file(&mut self, _schema: &FileSchema, flow: &mut FileFlowPlanner) -> PlannerResult<()> {
        flow.error_taps = vec![ErrorTap::ReportErrors, ErrorTap::CountInvalidRows];
        Ok(())
    }
}

/// Turns relations into joins between planned files, or into missing
/// reference markers when one side has no file.
pub struct RelationPass;

impl PlanningPass for RelationPass {
    fn name(&self) -> &'static str {
        "relation"
    }

    fn link(&mut self, dictionary: &Dictionary, selected: &BTreeSet<String>, plan: &mut Plan) -> PlannerResult<()> {
        for child_index in 0..plan.flows.len() {
            let child_name = plan.flows[child_index].schema_name.clone();
            let Some(child_schema) = dictionary.file_schema(&child_name) else {
                continue;
            };

            for relation in &child_schema.relations {
                let Some(parent_index) = plan.flow_index(&relation.other) else {
                    plan.flows[child_index].missing_references.push(MissingReference {
                        kind: ReferenceKind::RelationTarget,
                        schema: relation.other.clone(),
                        fields: relation.fields.clone(),
                    });
                    continue;
                };
                let parent_schema = dictionary
                    .file_schema(&relation.other)
                    .ok_or_else(|| PlannerError::unknown_data_type(&relation.other))?;

                let child_indices = indices_of(child_schema, &relation.fields)?;
                let parent_indices = indices_of(parent_schema, &relation.other_fields)?;

                let id = plan.relations.len();
                plan.relations.push(RelationPlan {
                    join: RelationJoin {
                        child_schema: child_name.clone(),
                        child_file: plan.flows[child_index].file_name().to_string(),
                        child_fields: relation.fields.clone(),
                        parent_schema: relation.other.clone(),
                        parent_file: plan.flows[parent_index].file_name().to_string(),
                        parent_fields: relation.other_fields.clone(),
                        optionals: relation.optionals.clone(),
                        bidirectional: relation.bidirectional,
                    },
                });
                plan.flows[child_index].key_projections.push(KeyProjection {
                    relation: id,
                    side: KeySide::Child,
                    field_indices: child_indices,
                });
                plan.flows[parent_index].key_projections.push(KeyProjection {
                    relation: id,
                    side: KeySide::Parent,
                    field_indices: parent_indices,
                });
            }
        }

        let planned: HashSet<String> = plan.flows.iter().map(|f| f.schema_name.clone()).collect();
        for flow in &mut plan.flows {
            for child in dictionary.bidirectional_children(&flow.schema_name) {
                if !selected.contains(&child.name) || planned.contains(&child.name) {
                    continue;
                }
                let fields = child
                    .relations
                    .iter()
                    .find(|r| r.bidirectional && r.other == flow.schema_name)
                    .map(|r| r.other_fields.clone())
                    .unwrap_or_default();
                flow.missing_references.push(MissingReference {
                    kind: ReferenceKind::ReverseRelation,
                    schema: child.name.clone(),
                    fields,
                });
            }
        }

        Ok(())
    }
}

fn indices_of(schema: &FileSchema, names: &[String]) -> PlannerResult<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            schema
                .field_index(name)
                .ok_or_else(|| PlannerError::unknown_field(&schema.name, name))
        })
        .collect()
}
