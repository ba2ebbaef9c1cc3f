//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Dattrs.
//! The Dattrs project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use dattrs::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Value};

const SPECIAL: [i64; 3] = [-3, 7, 8];

fn outcome_for(count: usize) -> Outcome {
    if count == 0 {
        Outcome::Pass
    } else {
        Outcome::Fail { count }
    }
}

fn field_x(combine: CombineMode, invert: bool) -> Field<MemoryBackend> {
    let ns = MemoryBackend::namespace();
    Field::new("x", DataType::Int64)
        .validator(ns.resolve("ge").unwrap().with_args(vec![json!(0)]))
        .validator(ns.resolve("is_in").unwrap().with_args(vec![json!(SPECIAL)]))
        .combine(combine)
        .invert(invert)
}

fn frame_of(values: &[i64]) -> MemoryFrame {
    MemoryFrame::from_columns(vec![("x", values.iter().map(|v| json!(v)).collect())]).unwrap()
}

fn check(field: Field<MemoryBackend>, values: &[i64]) -> Outcome {
    let schema = Schema::new("truth", vec![field]).unwrap();
    let report = validate(&schema, &frame_of(values)).unwrap();
    *report.get("x").unwrap()
}

#[test]
fn duplicated_ids_fail_with_every_offending_row() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "phonebook",
        vec![Field::new("id", DataType::Int16).validator(ns.resolve("is_unique").unwrap())],
    )
    .unwrap();
    let frame = convert(
        &schema,
        MemoryFrame::from_columns(vec![("id", vec![json!(0), json!(1), json!(2), json!(2)])])
            .unwrap(),
    )
    .unwrap();

    let outcomes = validate(&schema, &frame).unwrap();
    assert_eq!(outcomes.get("id"), Some(&Outcome::Fail { count: 2 }));
    assert_eq!(
        report::render(&outcomes),
        vec!["Field: id (id) | [FAILURE] There are 2 rows that failed."]
    );
}

#[test]
fn one_failing_field_does_not_stop_the_others() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![
            Field::new("id", DataType::Int64).validator(ns.resolve("is_unique").unwrap()),
            Field::new("name", DataType::String).validator(!ns.resolve("is_null").unwrap()),
            Field::new("age", DataType::Int64)
                .validator(ns.resolve("ge").unwrap().with_args(vec![json!(0)])),
        ],
    )
    .unwrap();
    let frame = MemoryFrame::from_records(&[
        json!({"id": 1, "name": "ada", "age": -1}),
        json!({"id": 1, "name": null, "age": 30}),
    ])
    .unwrap();

    let report = validate(&schema, &frame).unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.get("id"), Some(&Outcome::Fail { count: 2 }));
    assert_eq!(report.get("name"), Some(&Outcome::Fail { count: 1 }));
    assert_eq!(report.get("age"), Some(&Outcome::Fail { count: 1 }));
    assert_eq!(report.total_failed_rows(), 4);
    assert!(matches!(
        report.ensure_passed(),
        Err(DattrsError::Validation { .. })
    ));
}

#[test]
fn null_predicates_are_neither_pass_nor_fail() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "ages",
        vec![Field::new("age", DataType::Int64)
            .validator(ns.resolve("ge").unwrap().with_args(vec![json!(0)]))],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![("age", vec![Value::Null, json!(4)])]).unwrap();

    let report = validate(&schema, &frame).unwrap();
    assert_eq!(report.get("age"), Some(&Outcome::Pass));
}

#[test]
fn non_boolean_predicates_are_setup_errors() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "names",
        vec![Field::new("name", DataType::String)
            .validator(ns.resolve_path("str.to_uppercase").unwrap())],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![("name", vec![json!("ada")])]).unwrap();

    let err = validate(&schema, &frame).unwrap_err();
    assert!(matches!(err, DattrsError::ValidationSetup { ref field, .. } if field == "name"));
}

#[test]
fn validation_reads_the_alias_column() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("name", DataType::String)
            .alias("full_name")
            .validator(ns.resolve_path("str.starts_with").unwrap().with_args(vec![json!("A")]))],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![
        ("name", vec![json!("zed"), json!("zoe")]),
        ("full_name", vec![json!("Ada"), json!("Alan")]),
    ])
    .unwrap();

    let report = validate(&schema, &frame).unwrap();
    assert_eq!(report.get("name"), Some(&Outcome::Pass));
}

proptest! {
    #[test]
    fn strict_fails_rows_failing_any_validator(values in proptest::collection::vec(-10i64..10, 1..40)) {
        let expected = values
            .iter()
            .filter(|x| !(**x >= 0 && SPECIAL.contains(x)))
            .count();
        prop_assert_eq!(check(field_x(CombineMode::Strict, false), &values), outcome_for(expected));
    }

    #[test]
    fn lenient_fails_rows_failing_every_validator(values in proptest::collection::vec(-10i64..10, 1..40)) {
        let expected = values
            .iter()
            .filter(|x| !(**x >= 0 || SPECIAL.contains(x)))
            .count();
        prop_assert_eq!(check(field_x(CombineMode::Lenient, false), &values), outcome_for(expected));
    }

    #[test]
    fn invert_flips_every_row(values in proptest::collection::vec(-10i64..10, 1..40)) {
        for combine in [CombineMode::Strict, CombineMode::Lenient] {
            let plain = check(field_x(combine, false), &values).failed_rows();
            let inverted = check(field_x(combine, true), &values).failed_rows();
            prop_assert_eq!(plain + inverted, values.len());
        }
    }
}

#[test]
fn invert_gives_complementary_outcomes_for_a_single_match() {
    let ns = MemoryBackend::namespace();
    let is_two = || ns.resolve("eq").unwrap().with_args(vec![json!(2)]);
    let values = [1, 2, 3];

    let plain = Field::new("x", DataType::Int64).validator(is_two());
    let inverted = Field::new("x", DataType::Int64).validator(is_two()).invert(true);

    assert_eq!(check(plain, &values), Outcome::Fail { count: 2 });
    assert_eq!(check(inverted, &values), Outcome::Fail { count: 1 });
}

#[test]
fn severity_travels_with_the_outcome() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "ages",
        vec![Field::new("age", DataType::Int64)
            .validator(ns.resolve("ge").unwrap().with_args(vec![json!(0)]))
            .severity(Severity::Critical)],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![("age", vec![json!(-4)])]).unwrap();

    let outcomes = validate(&schema, &frame).unwrap();
    assert_eq!(outcomes.outcomes[0].severity, Severity::Critical);
    assert_eq!(outcomes.failures().count(), 1);
}

#[test]
fn ids_beyond_float_precision_stay_distinct() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "ledger",
        vec![Field::new("id", DataType::Int64).validator(ns.resolve("is_unique").unwrap())],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![(
        "id",
        vec![json!(9_007_199_254_740_992_i64), json!(9_007_199_254_740_993_i64)],
    )])
    .unwrap();

    let outcomes = validate(&schema, &frame).unwrap();
    assert_eq!(outcomes.get("id"), Some(&Outcome::Pass));
}
