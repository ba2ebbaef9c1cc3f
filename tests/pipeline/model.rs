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
use dattrs::run_with;
use serde_json::{json, Value};

struct Phonebook;

impl Model for Phonebook {
    type Backend = MemoryBackend;

    fn schema() -> Result<Schema<MemoryBackend>> {
        let ns = MemoryBackend::namespace();
        Schema::new(
            "phonebook",
            vec![
                Field::new("id", DataType::Int16).validator(ns.resolve("is_unique")?),
                Field::new("name", DataType::String)
                    .default_value(json!("Unknown"))
                    .converter(ns.resolve_path("str.to_uppercase")?)
                    .converter(ExprStep::<MemoryBackend>::custom("shout", |expr: MemoryExpr| {
                        Ok(expr.concat_str("!"))
                    }))
                    .alias("full_name")
                    .validator(ns.resolve_path("str.ends_with")?.with_args(vec![json!("!")])),
            ],
        )
    }
}

fn contacts() -> MemoryFrame {
    MemoryFrame::from_columns(vec![
        ("id", vec![json!(0), json!(1), json!(2), json!(2)]),
        (
            "name",
            vec![json!("ada"), Value::Null, json!("bob"), json!("cy")],
        ),
    ])
    .unwrap()
}

#[test]
fn pipe_converts_then_validates() {
    let output = Phonebook::pipe(contacts()).unwrap();

    assert_eq!(
        output.frame.column_values("full_name").unwrap(),
        &[json!("ADA!"), json!("UNKNOWN!"), json!("BOB!"), json!("CY!")]
    );
    assert_eq!(output.frame.dtype("id"), Some(&DataType::Int16));

    let validation = output.validation.as_ref().unwrap();
    assert_eq!(validation.get("id"), Some(&Outcome::Fail { count: 2 }));
    assert_eq!(validation.get("name"), Some(&Outcome::Pass));
    assert!(output.pre_validation.is_none());
    assert!(!output.passed());
}

#[test]
fn provided_methods_agree_with_pipe() {
    let converted = Phonebook::convert(contacts()).unwrap();
    let report = Phonebook::validate(&converted).unwrap();
    let piped = Phonebook::pipe(contacts()).unwrap();

    assert_eq!(piped.frame, converted);
    assert_eq!(piped.validation, Some(report));
}

#[test]
fn validate_mode_checks_the_raw_frame() {
    let schema = Phonebook::schema().unwrap();
    let output = run(&schema, contacts(), RunMode::Validate).unwrap();

    let validation = output.validation.unwrap();
    assert_eq!(validation.get("id"), Some(&Outcome::Fail { count: 2 }));
    assert_eq!(validation.skipped, vec!["name"]);
    assert_eq!(output.frame, contacts());
}

#[test]
fn convert_mode_produces_no_report() {
    let schema = Phonebook::schema().unwrap();
    let output = run(&schema, contacts(), RunMode::Convert).unwrap();

    assert!(output.validation.is_none());
    assert!(output.passed());
    assert!(output.into_frame().has_column("full_name"));
}

#[test]
fn validate_convert_validate_reports_before_and_after() {
    let schema = Phonebook::schema().unwrap();
    let output = run(&schema, contacts(), RunMode::ValidateConvertValidate).unwrap();

    let before = output.pre_validation.as_ref().unwrap();
    let after = output.validation.as_ref().unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
    assert_eq!(after.get("name"), Some(&Outcome::Pass));
}

#[test]
fn strict_runs_keep_only_declared_columns() {
    let frame = contacts()
        .with_columns(vec![("notes".to_string(), MemoryExpr::literal("n/a"))])
        .unwrap();
    let output = run_with(
        &Phonebook::schema().unwrap(),
        frame,
        RunMode::ConvertThenValidate,
        ConvertOptions::strict(),
    )
    .unwrap();

    assert_eq!(output.frame.columns(), vec!["id", "full_name"]);
}

#[test]
fn conversion_errors_abort_every_mode_that_converts() {
    let frame = MemoryFrame::from_columns(vec![("name", vec![json!("ada")])]).unwrap();
    let schema = Phonebook::schema().unwrap();

    for mode in [
        RunMode::Convert,
        RunMode::ConvertThenValidate,
        RunMode::ValidateConvertValidate,
    ] {
        let err = run(&schema, frame.clone(), mode).unwrap_err();
        assert_eq!(err, DattrsError::missing_default("id"));
    }
    assert!(run(&schema, frame, RunMode::Validate).is_ok());
}
