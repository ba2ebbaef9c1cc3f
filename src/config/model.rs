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

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::stage::StageConfig;
use super::{ordered, read_document};
use crate::backend::Backend;
use crate::errors::{DattrsError, Result};
use crate::model::{run, RunMode};
use crate::namespace::OperationNamespace;
use crate::report;
use crate::schema::Schema;
use crate::validate::ValidationReport;

/// Where a model's input comes from. Reading it is left to the caller;
/// every key besides `path` is kept as a reader option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

#[derive(Deserialize)]
struct StagePaths(#[serde(with = "ordered")] Vec<(String, PathBuf)>);

/// Stages as a list of stage objects, or as a `name: path` mapping.
fn deserialize_stages<'de, D>(deserializer: D) -> std::result::Result<Vec<StageConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stages {
        List(Vec<StageConfig>),
        Paths(StagePaths),
    }

    Ok(match Stages::deserialize(deserializer)? {
        Stages::List(stages) => stages,
        Stages::Paths(StagePaths(paths)) => paths
            .into_iter()
            .map(|(name, path)| StageConfig::from_path(name, path))
            .collect(),
    })
}

/// Model file referenced through [`ModelConfig::config`].
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    sources: Vec<SourceConfig>,
    #[serde(default, deserialize_with = "deserialize_stages")]
    stages: Vec<StageConfig>,
}

/// A named sequence of stages over declared sources.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// File holding `sources` and `stages`, instead of declaring them inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default, deserialize_with = "deserialize_stages")]
    pub stages: Vec<StageConfig>,
}

impl ModelConfig {
    /// Returns the model with `config` expanded into sources and stages.
    pub fn load(&self) -> Result<ModelConfig> {
        let Some(path) = &self.config else {
            return Ok(self.clone());
        };
        if !self.sources.is_empty() || !self.stages.is_empty() {
            return Err(DattrsError::config(format!(
                "model '{}' passes sources or stages alongside a config file",
                self.name
            )));
        }

        let file: ModelFile = read_document(path)?;
        let mut model = ModelConfig {
            name: self.name.clone(),
            config: Some(path.clone()),
            sources: file.sources,
            stages: file.stages,
        };
        if let Some(base) = path.parent() {
            model.resolve_relative_to(base);
        }
        Ok(model)
    }

    pub(crate) fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(config) = &self.config {
            if config.is_relative() {
                self.config = Some(base.join(config));
            }
        }
        for stage in &mut self.stages {
            stage.resolve_relative_to(base);
        }
    }

    /// Compiles every stage against `namespace`.
    pub fn compile<B: Backend>(&self, namespace: &OperationNamespace<B>) -> Result<CompiledModel<B>> {
        let model = self.load()?;
        let stages = model
            .stages
            .iter()
            .map(|stage| stage.compile(namespace))
            .collect::<Result<Vec<_>>>()?;

        log::info!("compiled model '{}' with {} stage(s)", model.name, stages.len());
        Ok(CompiledModel {
            name: model.name,
            sources: model.sources,
            stages,
        })
    }
}

/// Validation report of one stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub report: ValidationReport,
}

/// Final frame of a model run plus one report per stage.
#[derive(Clone, Debug)]
pub struct ModelRun<F> {
    pub frame: F,
    pub reports: Vec<StageReport>,
}

impl<F> ModelRun<F> {
    pub fn passed(&self) -> bool {
        self.reports.iter().all(|stage| stage.report.passed())
    }
}

/// Model whose stages are ready to run.
pub struct CompiledModel<B: Backend> {
    pub name: String,
    pub sources: Vec<SourceConfig>,
    pub stages: Vec<Schema<B>>,
}

impl<B: Backend> Clone for CompiledModel<B> {
    fn clone(&self) -> Self {
        CompiledModel {
            name: self.name.clone(),
            sources: self.sources.clone(),
            stages: self.stages.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for CompiledModel<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModel")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("stages", &self.stages)
            .finish()
    }
}

impl<B: Backend> CompiledModel<B> {
    /// Runs every stage in order: each converts the previous stage's output
    /// and validates its own result. A conversion error aborts the run;
    /// validation failures are reported and the run continues.
    pub fn apply(&self, frame: B::Frame) -> Result<ModelRun<B::Frame>> {
        let mut frame = frame;
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            log::info!("model '{}': running stage '{}'", self.name, stage.name());
            let output = run(stage, frame, RunMode::ConvertThenValidate)?;
            let validation = output
                .validation
                .unwrap_or_else(|| ValidationReport::new(stage.name()));
            report::emit(stage.name(), &validation);
            reports.push(StageReport {
                stage: stage.name().to_string(),
                report: validation,
            });
            frame = output.frame;
        }

        Ok(ModelRun { frame, reports })
    }
}
