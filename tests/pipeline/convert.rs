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
use dattrs::testing::assert_frame_equal;
use proptest::prelude::*;
use serde_json::{json, Value};

fn people() -> MemoryFrame {
    MemoryFrame::from_records(&[
        json!({"id": 1, "name": "ada", "score": 9.5}),
        json!({"id": 2, "name": null, "score": 7.0}),
        json!({"id": 3, "name": "grace", "score": 8.25}),
    ])
    .unwrap()
}

#[test]
fn unconverted_fields_keep_their_values() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![
            Field::new("id", DataType::Int64),
            Field::new("score", DataType::Float64),
        ],
    )
    .unwrap();

    let input = people();
    let out = convert(&schema, input.clone()).unwrap();
    assert_frame_equal(&out, &input);
}

#[test]
fn missing_column_becomes_constant_default() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("nickname", DataType::String).default_value(json!("Unknown"))],
    )
    .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(
        out.column_values("nickname").unwrap(),
        &[json!("Unknown"), json!("Unknown"), json!("Unknown")]
    );
    assert_eq!(out.dtype("nickname"), Some(&DataType::String));
}

#[test]
fn defaults_are_cast_to_the_declared_type() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("rank", DataType::Int16).default_value(json!("5"))],
    )
    .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(
        out.column_values("rank").unwrap(),
        &[json!(5), json!(5), json!(5)]
    );
}

#[test]
fn defaults_fill_nulls_of_existing_columns() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("name", DataType::String).default_value(json!("Unknown"))],
    )
    .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(
        out.column_values("name").unwrap(),
        &[json!("ada"), json!("Unknown"), json!("grace")]
    );
}

#[test]
fn missing_column_without_default_is_missing_default() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![
            Field::new("id", DataType::Int64),
            Field::new("email", DataType::String),
        ],
    )
    .unwrap();

    let err = convert(&schema, people()).unwrap_err();
    assert_eq!(err, DattrsError::missing_default("email"));
}

#[test]
fn unrepresentable_values_are_cast_errors_naming_the_field() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("name", DataType::Int16).alias("name_code")],
    )
    .unwrap();

    match convert(&schema, people()).unwrap_err() {
        DattrsError::Cast {
            field,
            source_type,
            target_type,
            ..
        } => {
            assert_eq!(field, "name");
            assert_eq!(source_type, "String");
            assert_eq!(target_type, "Int16");
        }
        other => panic!("expected a cast error, got {other:?}"),
    }
}

#[test]
fn converters_run_after_cast_and_before_alias() {
    let ns = MemoryBackend::namespace();
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![Field::new("id", DataType::String)
            .converter(ns.resolve_path("str.len_chars").unwrap())
            .alias("id_width")],
    )
    .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(
        out.column_values("id_width").unwrap(),
        &[json!(1), json!(1), json!(1)]
    );
    assert!(out.has_column("id"));
}

#[test]
fn hooks_wrap_the_conversion() {
    let ns = MemoryBackend::namespace();
    let adults = ns.resolve("gt").unwrap().with_args(vec![json!(1)]);
    let schema = Schema::<MemoryBackend>::builder("people")
        .field(Field::new("id", DataType::Int64))
        .field(
            Field::new("name", DataType::String)
                .default_value(json!("Unknown"))
                .converter(ns.resolve_path("str.to_uppercase").unwrap()),
        )
        .pre_convert(move |frame: MemoryFrame| {
            let predicate = adults.invoke(MemoryBackend::col("id"))?;
            frame.filter(&predicate)
        })
        .post_convert(|frame: MemoryFrame| {
            frame.with_columns(vec![(
                "greeting".to_string(),
                MemoryExpr::column("name").concat_str("!"),
            )])
        })
        .build()
        .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(out.row_count(), 2);
    assert_eq!(
        out.column_values("greeting").unwrap(),
        &[json!("UNKNOWN!"), json!("GRACE!")]
    );
}

#[test]
fn existence_is_checked_after_the_pre_hook() {
    let schema = Schema::<MemoryBackend>::builder("people")
        .field(Field::new("email", DataType::String))
        .pre_convert(|frame: MemoryFrame| {
            frame.with_columns(vec![(
                "email".to_string(),
                MemoryExpr::literal("nobody@example.org"),
            )])
        })
        .build()
        .unwrap();

    let out = convert(&schema, people()).unwrap();
    assert_eq!(out.column_values("email").unwrap()[0], json!("nobody@example.org"));
}

#[test]
fn failed_conversion_returns_no_partial_frame() {
    let schema = Schema::<MemoryBackend>::new(
        "people",
        vec![
            Field::new("id", DataType::String),
            Field::new("name", DataType::Float64),
        ],
    )
    .unwrap();

    let input = people();
    assert!(convert(&schema, input.clone()).is_err());
    assert_eq!(input.dtype("id"), Some(&DataType::Int64));
}

#[test]
fn timezone_formats_are_rejected_when_compiling() {
    let ns = MemoryBackend::namespace();
    let render = ns
        .resolve_path("dt.to_string")
        .unwrap()
        .with_args(vec![json!("%Y %z")]);

    let err = render.invoke(MemoryExpr::column("t")).unwrap_err();
    assert!(matches!(
        err,
        DattrsError::InvalidArguments { ref operation, .. } if operation == "dt.to_string"
    ));

    let plain = ns
        .resolve_path("dt.to_string")
        .unwrap()
        .with_args(vec![json!("%Y")]);
    let schema = Schema::<MemoryBackend>::new(
        "events",
        vec![Field::new("t", DataType::Datetime).converter(plain)],
    )
    .unwrap();
    let frame = MemoryFrame::from_columns(vec![("t", vec![json!("2024-03-01 08:00:00")])]).unwrap();
    let out = convert(&schema, frame).unwrap();
    assert_eq!(out.column_values("t").unwrap(), &[json!("2024")]);
}

proptest! {
    #[test]
    fn uppercase_conversion_is_idempotent(names in proptest::collection::vec("[a-zA-Z ]{0,12}", 1..20)) {
        let ns = MemoryBackend::namespace();
        let schema = Schema::<MemoryBackend>::new(
            "names",
            vec![Field::new("name", DataType::String)
                .converter(ns.resolve_path("str.strip_chars").unwrap())
                .converter(ns.resolve_path("str.to_uppercase").unwrap())],
        )
        .unwrap();

        let values: Vec<Value> = names.into_iter().map(Value::String).collect();
        let frame = MemoryFrame::from_columns(vec![("name", values)]).unwrap();

        let once = convert(&schema, frame).unwrap();
        let twice = convert(&schema, once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
