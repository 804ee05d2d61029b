//! Restriction Property Tests
//!
//! - Range bounds are inclusive on both ends
//! - A value passes a range iff min <= v <= max
//! - N rows sharing one unique key give N errors, not N - 1

use dictgate::dictionary::ValueType;
use dictgate::report::{ErrorType, TupleState};
use dictgate::restriction::{
    RangeCheck, Row, RowCheck, TypedValue, UniqueKeyCollector, ValueConventions, ValueTypeCheck,
};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn range_errors(value_type: ValueType, min: f64, max: f64, cell: &str) -> Vec<ErrorType> {
    let names = vec!["donor_age".to_string()];
    let cells = [cell];
    let mut typed = [TypedValue::Raw];
    let conventions = ValueConventions::default();
    let mut row = Row::new("PROJ-A", &names, &cells, &mut typed, &conventions);
    let mut state = TupleState::new(2);

    let checks = [
        RowCheck::ValueType(ValueTypeCheck {
            field_index: 0,
            field_name: "donor_age".to_string(),
            value_type,
        }),
        RowCheck::Range(RangeCheck {
            field_index: 0,
            field_name: "donor_age".to_string(),
            min,
            max,
            number: 0,
        }),
    ];
    for check in &checks {
        check.evaluate(&mut row, &mut state);
    }
    state.errors().iter().map(|e| e.error_type).collect()
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_integer_bounds_pass() {
    assert!(range_errors(ValueType::Integer, 0.0, 120.0, "0").is_empty());
    assert!(range_errors(ValueType::Integer, 0.0, 120.0, "120").is_empty());
    assert_eq!(
        range_errors(ValueType::Integer, 0.0, 120.0, "121"),
        vec![ErrorType::OutOfRangeError]
    );
}

#[test]
fn test_missing_codes_skip_range() {
    assert!(range_errors(ValueType::Integer, 0.0, 120.0, "-888").is_empty());
    assert!(range_errors(ValueType::Integer, 0.0, 120.0, "").is_empty());
}

proptest! {
    #[test]
    fn prop_integer_range_is_inclusive(min in -1000i64..1000, span in 0i64..1000, v in -3000i64..3000) {
        let max = min + span;
        let errors = range_errors(ValueType::Integer, min as f64, max as f64, &v.to_string());
        let inside = min <= v && v <= max;
        prop_assert_eq!(errors.is_empty(), inside);
    }

    #[test]
    fn prop_decimal_bounds_themselves_pass(min in -1.0e6f64..1.0e6, span in 0.0f64..1.0e6) {
        let max = min + span;
        prop_assert!(range_errors(ValueType::Decimal, min, max, &min.to_string()).is_empty());
        prop_assert!(range_errors(ValueType::Decimal, min, max, &max.to_string()).is_empty());
    }

    #[test]
    fn prop_unique_reports_every_duplicate(n in 2u64..50, others in 0u64..20) {
        let mut collector = UniqueKeyCollector::new(vec![0], vec!["donor_id".to_string()]);
        let mut line = 2;
        for _ in 0..n {
            collector.observe(&["D1"], line);
            line += 1;
        }
        for i in 0..others {
            let id = format!("X{}", i);
            collector.observe(&[id.as_str()], line);
            line += 1;
        }
        let errors = collector.finish("donor.txt");
        prop_assert_eq!(errors.len() as u64, n);
        let lines: Vec<u64> = errors.iter().filter_map(|e| e.line_number).collect();
        prop_assert_eq!(lines, (2..2 + n).collect::<Vec<_>>());
    }
}
