//! Donor Scenario Tests
//!
//! File `donor.tsv` with rows D1/M, D1/F, D2/X against a donor schema with a
//! `sex_codes` code list {M, F} and unique key {donor_id}:
//! - one uniqueness error per D1 row
//! - one code list error for D2
//! - both D1 rows pass the code list check

use std::fs;
use std::sync::Arc;

use dictgate::dictionary::{ActiveDictionary, CodeList, CodeLists, Dictionary, Field, FileSchema, Restriction};
use dictgate::plan_and_validate;
use dictgate::planner::DataTypeSelection;
use dictgate::report::{ErrorParameterKey, ErrorType, ValidationError};
use dictgate::store::{LocalFileStore, MemoryFileStore};
use dictgate::validation::{Validation, ValidationContext, ValidationOutcome};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Helper Functions
// =============================================================================

const DONOR: &str = "donor_id\tdonor_sex\nD1\tM\nD1\tF\nD2\tX\n";

fn dictionary() -> Dictionary {
    Dictionary::new("1.0").with_file(
        FileSchema::new("donor", r"^donor\.tsv$")
            .with_field(Field::text("donor_id"))
            .with_field(Field::text("donor_sex").with_restriction(Restriction::codelist("sex_codes")))
            .with_unique_key(["donor_id"]),
    )
}

fn codelists() -> CodeLists {
    CodeLists::from_lists(vec![CodeList::new("sex_codes")
        .with_term("M", "Male")
        .with_term("F", "Female")])
    .unwrap()
}

fn summary(outcome: &ValidationOutcome) -> Vec<(ErrorType, Option<u64>, String)> {
    outcome
        .report
        .errors()
        .map(|e| (e.error_type, e.line_number, e.value.clone()))
        .collect()
}

fn expected() -> Vec<(ErrorType, Option<u64>, String)> {
    vec![
        (ErrorType::CodelistError, Some(4), "X".to_string()),
        (ErrorType::UniqueValueError, Some(2), "[D1]".to_string()),
        (ErrorType::UniqueValueError, Some(3), "[D1]".to_string()),
    ]
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_donor_scenario_in_memory() {
    let store = MemoryFileStore::new().with_file("donor.tsv", DONOR);
    let (plan, outcome) = plan_and_validate(
        "PROJ-DONOR",
        dictionary(),
        codelists(),
        &DataTypeSelection::All,
        Arc::new(store),
    )
    .unwrap();

    assert_eq!(plan.file_names(), vec!["donor.tsv"]);
    assert!(!outcome.is_valid());
    assert_eq!(summary(&outcome), expected());

    let codelist = outcome.report.errors_of(ErrorType::CodelistError);
    assert_eq!(codelist[0].field_names, vec!["donor_sex"]);
    assert_eq!(
        codelist[0].param(ErrorParameterKey::Expected).unwrap(),
        "sex_codes"
    );
}

#[test]
fn test_donor_scenario_on_disk_persists_json_lines() {
    let submission = TempDir::new().unwrap();
    fs::write(submission.path().join("donor.tsv"), DONOR).unwrap();
    let output = TempDir::new().unwrap();

    let active = ActiveDictionary::new(dictionary(), codelists()).unwrap();
    let store = Arc::new(LocalFileStore::new(submission.path()));
    let context = ValidationContext::new("PROJ-DONOR", &active, &DataTypeSelection::All, store).unwrap();
    let outcome = Validation::new(context).execute(&CancellationToken::new()).unwrap();
    assert_eq!(summary(&outcome), expected());

    let written = outcome.report.write_json_lines(output.path()).unwrap();
    assert_eq!(written, vec![output.path().join("donor.tsv.errors.json")]);

    let content = fs::read_to_string(&written[0]).unwrap();
    let lines: Vec<serde_json::Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["fileName"], "donor.tsv");
    assert_eq!(lines[0]["type"], "CODELIST_ERROR");
    assert_eq!(lines[0]["lineNumber"], 4);
    assert_eq!(lines[0]["fieldNames"][0], "donor_sex");

    let parsed: Vec<ValidationError> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    let original: Vec<ValidationError> = outcome.report.errors().cloned().collect();
    assert_eq!(parsed, original);
}

#[test]
fn test_rerun_gives_identical_error_list() {
    let run = || {
        let store = MemoryFileStore::new().with_file("donor.tsv", DONOR);
        let (_, outcome) =
            plan_and_validate("PROJ-DONOR", dictionary(), codelists(), &DataTypeSelection::All, Arc::new(store))
                .unwrap();
        outcome.report.errors().cloned().collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
