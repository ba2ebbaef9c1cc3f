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

use std::fs;
use std::path::Path;

use dattrs::config::{ConfigFile, ModelConfig, StageConfig};
use dattrs::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const CONFIG: &str = r#"
metadata:
  analytic:
    name: phonebook
models:
  - name: contacts
    sources:
      - path: contacts.csv
        separator: ";"
    stages:
      raw: stages/raw.yaml
      clean: stages/clean.json
"#;

const RAW_STAGE: &str = r#"
schema:
  id:
    dtype: int64
    validator:
      - function: is_unique
  name:
    default: Unknown
"#;

const CLEAN_STAGE: &str = r#"{
  "schema": {
    "name": {
      "alias": "display_name",
      "converter": [{"function": "str.to_uppercase"}],
      "validator": [
        {"function": "str.starts_with", "args": ["A"], "level": "error"}
      ]
    }
  }
}"#;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "config.yaml", CONFIG);
    write(dir.path(), "stages/raw.yaml", RAW_STAGE);
    write(dir.path(), "stages/clean.json", CLEAN_STAGE);
    dir
}

fn contacts() -> MemoryFrame {
    MemoryFrame::from_records(&[
        json!({"id": 1, "name": "ada"}),
        json!({"id": 2, "name": null}),
        json!({"id": 2, "name": "al"}),
    ])
    .unwrap()
}

#[test]
fn stage_paths_resolve_against_the_config_file() {
    let dir = project();
    let config = ConfigFile::load(dir.path().join("config.yaml")).unwrap();

    let model = config.model("contacts").unwrap();
    assert_eq!(model.sources[0].options["separator"], json!(";"));
    assert_eq!(
        model.stages[0].path.as_deref(),
        Some(dir.path().join("stages/raw.yaml").as_path())
    );
}

#[test]
fn compiled_model_runs_every_stage_in_order() {
    let dir = project();
    let config = ConfigFile::load(dir.path().join("config.yaml")).unwrap();
    let models = config.compile(&MemoryBackend::namespace()).unwrap();
    assert_eq!(models.len(), 1);

    let run = models[0].apply(contacts()).unwrap();
    let stages: Vec<&str> = run.reports.iter().map(|entry| entry.stage.as_str()).collect();
    assert_eq!(stages, vec!["raw", "clean"]);

    let raw = &run.reports[0].report;
    assert_eq!(raw.get("id"), Some(&Outcome::Fail { count: 2 }));

    let clean = &run.reports[1].report;
    assert_eq!(clean.get("name"), Some(&Outcome::Fail { count: 1 }));
    assert_eq!(clean.outcomes[0].severity, Severity::Error);
    assert_eq!(clean.outcomes[0].alias, "display_name");

    assert_eq!(
        run.frame.column_values("display_name").unwrap(),
        &[json!("ADA"), json!("UNKNOWN"), json!("AL")]
    );
    assert!(!run.passed());
}

#[test]
fn model_files_hold_sources_and_stages() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "config.json",
        r#"{"models": [{"name": "contacts", "config": "models/contacts.yml"}]}"#,
    );
    write(
        dir.path(),
        "models/contacts.yml",
        r#"
sources:
  - path: contacts.parquet
stages:
  - name: inline
    schema:
      id:
        dtype: int16
        validator:
          - function: ge
            args: [0]
"#,
    );

    let config = ConfigFile::load(dir.path().join("config.json")).unwrap();
    let model = config.models[0].load().unwrap();
    assert_eq!(model.sources[0].path, "contacts.parquet");
    assert_eq!(model.stages[0].schema[0].0, "id");

    let compiled = model.compile(&MemoryBackend::namespace()).unwrap();
    let frame = MemoryFrame::from_columns(vec![("id", vec![json!(3), json!(-1)])]).unwrap();
    let run = compiled.apply(frame).unwrap();
    assert_eq!(run.reports[0].report.get("id"), Some(&Outcome::Fail { count: 1 }));
    assert_eq!(run.frame.dtype("id"), Some(&DataType::Int16));
}

#[test]
fn unsupported_extensions_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "raw.toml", "schema = {}");

    let stage = StageConfig::from_path("raw", dir.path().join("raw.toml"));
    let err = stage.compile(&MemoryBackend::namespace()).unwrap_err();
    assert!(matches!(err, DattrsError::Config { .. }));
}

#[test]
fn unknown_functions_in_stage_files_fail_compilation() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "raw.yaml",
        "schema:\n  id:\n    validator:\n      - function: str.is_shouting\n",
    );

    let stage = StageConfig::from_path("raw", dir.path().join("raw.yaml"));
    let err = stage.compile(&MemoryBackend::namespace()).unwrap_err();
    assert!(matches!(err, DattrsError::UnknownOperation { .. }));
}

#[test]
fn conversion_errors_abort_the_model_run() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "strict.yaml",
        "schema:\n  id:\n    dtype: int64\n  email:\n    dtype: string\n",
    );

    let model = ModelConfig {
        name: "contacts".to_string(),
        stages: vec![StageConfig::from_path("strict", dir.path().join("strict.yaml"))],
        ..ModelConfig::default()
    };
    let compiled = model.compile(&MemoryBackend::namespace()).unwrap();
    let err = compiled.apply(contacts()).unwrap_err();
    assert_eq!(err, DattrsError::missing_default("email"));
}

#[test]
fn null_defaults_mean_no_default() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "stage.yaml",
        "schema:\n  email:\n    default: null\n",
    );

    let stage = StageConfig::from_path("stage", dir.path().join("stage.yaml"))
        .load()
        .unwrap();
    assert_eq!(stage.schema[0].1.default, None::<Value>);
}
