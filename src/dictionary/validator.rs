//! Dictionary authoring checks
//!
//! Everything here runs before a plan is built. A dictionary that passes is
//! guaranteed to:
//! - Name every file schema and every field of a schema exactly once
//! - Carry compilable file name patterns
//! - Declare at most one restriction of each kind per field, Required excepted
//! - Only reference existing code lists, schemas and fields
//! - Declare relations of matching arity with consistent optionals
//!
//! Script syntax and return types are checked when the plan compiles them.

use std::collections::HashSet;

use super::codelist::CodeLists;
use super::errors::{DictionaryError, DictionaryResult};
use super::types::{Dictionary, Field, FileSchema, Relation, Restriction, RestrictionKind};

/// Validates a dictionary against its code lists.
///
/// The validator does not mutate the dictionary and stops at the first
/// violation.
pub struct DictionaryValidator<'a> {
    dictionary: &'a Dictionary,
    codelists: &'a CodeLists,
}

impl<'a> DictionaryValidator<'a> {
    pub fn new(dictionary: &'a Dictionary, codelists: &'a CodeLists) -> Self {
        Self {
            dictionary,
            codelists,
        }
    }

    /// Runs every authoring check.
    ///
    /// # Errors
    ///
    /// Returns the first `DictionaryError` found, in schema declaration order.
    pub fn validate(&self) -> DictionaryResult<()> {
        let mut names = HashSet::new();
        for schema in &self.dictionary.files {
            if !names.insert(schema.name.as_str()) {
                return Err(DictionaryError::duplicate_schema(&schema.name));
            }
        }

        for schema in &self.dictionary.files {
            self.validate_schema(schema)?;
        }

        Ok(())
    }

    fn validate_schema(&self, schema: &FileSchema) -> DictionaryResult<()> {
        schema.compile_pattern()?;

        let mut fields = HashSet::new();
        for field in &schema.fields {
            if !fields.insert(field.name.as_str()) {
                return Err(DictionaryError::duplicate_field(&schema.name, &field.name));
            }
            self.validate_field(schema, field)?;
        }

        for relation in &schema.relations {
            self.validate_relation(schema, relation)?;
        }

        for key in &schema.unique_keys {
            validate_unique_key(schema, key)?;
        }

        Ok(())
    }

    fn validate_field(&self, schema: &FileSchema, field: &Field) -> DictionaryResult<()> {
        let mut seen = HashSet::new();

        for restriction in &field.restrictions {
            let kind = restriction.kind();
            if kind != RestrictionKind::Required && !seen.insert(kind) {
                return Err(DictionaryError::duplicate_restriction(
                    &schema.name,
                    &field.name,
                    kind.as_str(),
                ));
            }

            match restriction {
                Restriction::Required { .. } => {}
                Restriction::Range { min, max } => {
                    if !field.value_type.is_numeric() {
                        return Err(DictionaryError::invalid_restriction(
                            &schema.name,
                            &field.name,
                            format!("range requires a numeric field, found {}", field.value_type),
                        ));
                    }
                    if !min.is_finite() || !max.is_finite() || min > max {
                        return Err(DictionaryError::invalid_restriction(
                            &schema.name,
                            &field.name,
                            format!("range bounds [{}, {}] are not ordered finite numbers", min, max),
                        ));
                    }
                }
                Restriction::DiscreteValues { values } => {
                    if values.is_empty() {
                        return Err(DictionaryError::invalid_restriction(
                            &schema.name,
                            &field.name,
                            "discrete values list is empty",
                        ));
                    }
                }
                Restriction::Codelist { name } => {
                    if !self.codelists.contains(name) {
                        return Err(DictionaryError::unknown_codelist(
                            &schema.name,
                            &field.name,
                            name,
                        ));
                    }
                }
                Restriction::Script { script, .. } => {
                    if script.trim().is_empty() {
                        return Err(DictionaryError::invalid_restriction(
                            &schema.name,
                            &field.name,
                            "script is empty",
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_relation(&self, schema: &FileSchema, relation: &Relation) -> DictionaryResult<()> {
        let name = &schema.name;

        if relation.fields.is_empty() {
            return Err(DictionaryError::invalid_relation(name, "relation has no fields"));
        }
        if relation.fields.len() != relation.other_fields.len() {
            return Err(DictionaryError::invalid_relation(
                name,
                format!(
                    "{} local fields but {} target fields",
                    relation.fields.len(),
                    relation.other_fields.len()
                ),
            ));
        }
        if has_duplicates(&relation.fields) || has_duplicates(&relation.other_fields) {
            return Err(DictionaryError::invalid_relation(
                name,
                format!("duplicate field in {}", relation.describe()),
            ));
        }

        let target = self.dictionary.file_schema(&relation.other).ok_or_else(|| {
            DictionaryError::invalid_relation(
                name,
                format!("target schema '{}' does not exist", relation.other),
            )
        })?;

        if let Some(missing) = relation.fields.iter().find(|f| schema.field(f).is_none()) {
            return Err(DictionaryError::invalid_relation(
                name,
                format!("unknown local field '{}'", missing),
            ));
        }
        if let Some(missing) = relation
            .other_fields
            .iter()
            .find(|f| target.field(f).is_none())
        {
            return Err(DictionaryError::invalid_relation(
                name,
                format!("unknown field '{}' in target '{}'", missing, target.name),
            ));
        }

        if !relation.optionals.is_empty() {
            if relation.bidirectional {
                return Err(DictionaryError::invalid_relation(
                    name,
                    "a bidirectional relation cannot have optional fields",
                ));
            }
            if relation.optionals.len() >= relation.fields.len() {
                return Err(DictionaryError::invalid_relation(
                    name,
                    "at least one relation field must be non-optional",
                ));
            }
            let mut seen = HashSet::new();
            for &index in &relation.optionals {
                if index >= relation.fields.len() || !seen.insert(index) {
                    return Err(DictionaryError::invalid_relation(
                        name,
                        format!("invalid optional index {}", index),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn validate_unique_key(schema: &FileSchema, key: &[String]) -> DictionaryResult<()> {
    if key.is_empty() {
        return Err(DictionaryError::invalid_unique_key(&schema.name, "key has no fields"));
    }
    if has_duplicates(key) {
        return Err(DictionaryError::invalid_unique_key(
            &schema.name,
            format!("duplicate field in {:?}", key),
        ));
    }
    if let Some(missing) = key.iter().find(|f| schema.field(f).is_none()) {
        return Err(DictionaryError::invalid_unique_key(
            &schema.name,
            format!("unknown field '{}'", missing),
        ));
    }
    Ok(())
}

fn has_duplicates(values: &[String]) -> bool {
    let mut seen = HashSet::new();
    values.iter().any(|v| !seen.insert(v.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::codelist::CodeList;
    use crate::dictionary::errors::DictionaryErrorCode;
    use crate::dictionary::types::Field;

    fn donor() -> FileSchema {
        FileSchema::new("donor", r"^donor\.txt$")
            .with_field(Field::text("donor_id").with_restriction(Restriction::required()))
            .with_field(Field::integer("donor_age").with_restriction(Restriction::range(0.0, 120.0)))
    }

    fn specimen(relation: Relation) -> FileSchema {
        FileSchema::new("specimen", r"^specimen\.txt$")
            .with_field(Field::text("donor_id"))
            .with_field(Field::text("specimen_id"))
            .with_relation(relation)
    }

    fn check(dictionary: &Dictionary) -> DictionaryResult<()> {
        let codelists = CodeLists::from_lists(vec![CodeList::new("sex").with_term("1", "male")]).unwrap();
        DictionaryValidator::new(dictionary, &codelists).validate()
    }

    fn code_of(result: DictionaryResult<()>) -> DictionaryErrorCode {
        result.unwrap_err().code()
    }

    #[test]
    fn test_valid_dictionary() {
        let dictionary = Dictionary::new("1")
            .with_file(donor())
            .with_file(specimen(Relation::new(["donor_id"], "donor", ["donor_id"]).bidirectional()));
        assert!(check(&dictionary).is_ok());
    }

    #[test]
    fn test_duplicate_restriction_kind() {
        let schema = FileSchema::new("donor", "^donor").with_field(
            Field::integer("age")
                .with_restriction(Restriction::range(0.0, 1.0))
                .with_restriction(Restriction::range(2.0, 3.0)),
        );
        let dictionary = Dictionary::new("1").with_file(schema);
        assert_eq!(code_of(check(&dictionary)), DictionaryErrorCode::DictDuplicateRestriction);
    }

    #[test]
    fn test_repeated_required_tolerated() {
        let schema = FileSchema::new("donor", "^donor").with_field(
            Field::text("id")
                .with_restriction(Restriction::required())
                .with_restriction(Restriction::required()),
        );
        assert!(check(&Dictionary::new("1").with_file(schema)).is_ok());
    }

    #[test]
    fn test_range_on_text_rejected() {
        let schema = FileSchema::new("donor", "^donor")
            .with_field(Field::text("id").with_restriction(Restriction::range(0.0, 1.0)));
        assert_eq!(
            code_of(check(&Dictionary::new("1").with_file(schema))),
            DictionaryErrorCode::DictInvalidRestriction
        );
    }

    #[test]
    fn test_unknown_codelist() {
        let schema = FileSchema::new("donor", "^donor")
            .with_field(Field::text("sex").with_restriction(Restriction::codelist("nope")));
        assert_eq!(
            code_of(check(&Dictionary::new("1").with_file(schema))),
            DictionaryErrorCode::DictUnknownCodelist
        );
    }

    #[test]
    fn test_relation_arity_mismatch() {
        let relation = Relation::new(["donor_id", "specimen_id"], "donor", ["donor_id"]);
        let dictionary = Dictionary::new("1").with_file(donor()).with_file(specimen(relation));
        assert_eq!(code_of(check(&dictionary)), DictionaryErrorCode::DictInvalidRelation);
    }

    #[test]
    fn test_relation_dangling_target() {
        let relation = Relation::new(["donor_id"], "sample", ["donor_id"]);
        let dictionary = Dictionary::new("1").with_file(donor()).with_file(specimen(relation));
        assert_eq!(code_of(check(&dictionary)), DictionaryErrorCode::DictInvalidRelation);
    }

    #[test]
    fn test_bidirectional_with_optionals_rejected() {
        let target = donor().with_field(Field::text("donor_age_extra"));
        let relation = Relation::new(["donor_id", "specimen_id"], "donor", ["donor_id", "donor_age_extra"])
            .bidirectional()
            .with_optionals(vec![1]);
        let dictionary = Dictionary::new("1").with_file(target).with_file(specimen(relation));
        assert_eq!(code_of(check(&dictionary)), DictionaryErrorCode::DictInvalidRelation);
    }

    #[test]
    fn test_all_optional_rejected() {
        let relation = Relation::new(["donor_id"], "donor", ["donor_id"]).with_optionals(vec![0]);
        let dictionary = Dictionary::new("1").with_file(donor()).with_file(specimen(relation));
        assert_eq!(code_of(check(&dictionary)), DictionaryErrorCode::DictInvalidRelation);
    }

    #[test]
    fn test_unique_key_unknown_field() {
        let schema = donor().with_unique_key(["donor_id", "missing"]);
        assert_eq!(
            code_of(check(&Dictionary::new("1").with_file(schema))),
            DictionaryErrorCode::DictInvalidUniqueKey
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let schema = FileSchema::new("donor", "^donor(");
        assert_eq!(
            code_of(check(&Dictionary::new("1").with_file(schema))),
            DictionaryErrorCode::DictInvalidPattern
        );
    }
}
