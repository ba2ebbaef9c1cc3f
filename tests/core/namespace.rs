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

use std::thread;

use dattrs::errors::DattrsError;
use dattrs::memory::{MemoryBackend, MemoryExpr, MemoryFrame};
use dattrs::namespace::Category;
use dattrs::{Backend, Frame};
use serde_json::{json, Map, Value};

fn apply(op: &dattrs::BoundOperation<MemoryBackend>, values: Vec<Value>) -> Vec<Value> {
    let frame = MemoryFrame::from_columns(vec![("a", values)]).unwrap();
    let expr = op.invoke(MemoryBackend::col("a")).unwrap();
    let out = frame.with_columns(vec![("out".to_string(), expr)]).unwrap();
    out.column_values("out").unwrap().to_vec()
}

#[test]
fn unknown_root_operation_names_namespace() {
    let err = MemoryBackend::namespace().resolve("is_fabulous").unwrap_err();
    assert_eq!(err, DattrsError::unknown_operation("is_fabulous", "expr"));
}

#[test]
fn unknown_category_in_path_is_unknown_operation() {
    let err = MemoryBackend::namespace()
        .resolve_path("bytes.len")
        .unwrap_err();
    assert!(matches!(err, DattrsError::UnknownOperation { .. }));
}

#[test]
fn category_operations_do_not_leak_to_root() {
    let ns = MemoryBackend::namespace();
    assert!(ns.category(Category::Text).contains("to_uppercase"));
    assert!(!ns.contains("to_uppercase"));
}

#[test]
fn bound_arguments_are_applied_lazily() {
    let ns = MemoryBackend::namespace();
    let between = ns
        .resolve("is_between")
        .unwrap()
        .with_args(vec![json!(1), json!(3)]);

    assert_eq!(
        apply(&between, vec![json!(0), json!(1), json!(3), json!(4)]),
        vec![json!(false), json!(true), json!(true), json!(false)]
    );

    let open = between.bind(
        vec![json!(1), json!(3)],
        Map::from_iter([("closed".to_string(), json!("none"))]),
    );
    assert_eq!(
        apply(&open, vec![json!(1), json!(2), json!(3)]),
        vec![json!(false), json!(true), json!(false)]
    );
}

#[test]
fn keyword_arguments_reach_category_operations() {
    let ns = MemoryBackend::namespace();
    let replace = ns.resolve_path("str.replace_all").unwrap().with_kwargs(Map::from_iter([
        ("pattern".to_string(), json!("-")),
        ("value".to_string(), json!("/")),
    ]));
    assert_eq!(
        apply(&replace, vec![json!("2024-03-01"), Value::Null]),
        vec![json!("2024/03/01"), Value::Null]
    );
}

#[test]
fn missing_parameters_fail_at_invocation() {
    let ns = MemoryBackend::namespace();
    let join = ns.category(Category::List).resolve("join").unwrap();
    let err = join.invoke(MemoryExpr::column("tags")).unwrap_err();
    assert!(matches!(
        err,
        DattrsError::InvalidArguments { ref operation, .. } if operation == "list.join"
    ));
}

#[test]
fn nested_categories_compose() {
    let ns = MemoryBackend::namespace();
    let first = ns.resolve_path("list.get").unwrap().with_args(vec![json!(0)]);
    let year = ns.resolve_path("dt.year").unwrap();

    let frame = MemoryFrame::from_columns(vec![(
        "events",
        vec![json!(["2021-05-04 10:00:00", "2022-01-01 00:00:00"]), json!([])],
    )])
    .unwrap();
    let expr = year
        .invoke(first.invoke(MemoryBackend::col("events")).unwrap())
        .unwrap();
    let out = frame.with_columns(vec![("first_year".to_string(), expr)]).unwrap();

    assert_eq!(
        out.column_values("first_year").unwrap(),
        &[json!(2021), Value::Null]
    );
}

#[test]
fn struct_members_are_addressable() {
    let ns = MemoryBackend::namespace();
    let city = ns
        .resolve_path("struct.field")
        .unwrap()
        .with_args(vec![json!("city")]);
    assert_eq!(
        apply(&city, vec![json!({"city": "Oslo", "zip": "0150"}), json!({"zip": "1"})]),
        vec![json!("Oslo"), Value::Null]
    );
}

#[test]
fn bound_operations_are_shareable_across_threads() {
    let op = MemoryBackend::namespace()
        .resolve("ge")
        .unwrap()
        .with_args(vec![json!(0)]);

    let handles: Vec<_> = (0..4)
        .map(|offset| {
            let op = op.clone();
            thread::spawn(move || apply(&op, vec![json!(offset - 2)]))
        })
        .collect();

    let results: Vec<Value> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(results, vec![json!(false), json!(false), json!(true), json!(true)]);
    assert_eq!(op.arguments().args, vec![json!(0)]);
}
