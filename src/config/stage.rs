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

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ordered, read_document};
use crate::backend::Backend;
use crate::dtype::DataType;
use crate::errors::{DattrsError, Result};
use crate::field::{CombineMode, Field, Severity};
use crate::namespace::{BoundOperation, OperationNamespace};
use crate::schema::Schema;

/// One converter or validator entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionConfig {
    /// Operation path: `is_unique`, `str.to_uppercase`, ...
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub level: Severity,
}

impl ExpressionConfig {
    pub fn new(function: impl Into<String>) -> Self {
        ExpressionConfig {
            function: function.into(),
            args: Vec::new(),
            parameters: Map::new(),
            level: Severity::default(),
        }
    }

    /// Resolves the function and binds its arguments.
    pub fn compile<B: Backend>(&self, namespace: &OperationNamespace<B>) -> Result<BoundOperation<B>> {
        let operation = namespace.resolve_path(&self.function)?;
        Ok(operation.bind(self.args.clone(), self.parameters.clone()))
    }
}

fn default_dtype() -> String {
    "string".to_string()
}

fn default_strict() -> bool {
    true
}

/// Declaration of one field inside a stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    #[serde(default = "default_dtype")]
    pub dtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Literal default; an explicit `null` means no default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub converter: Vec<ExpressionConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validator: Vec<ExpressionConfig>,
    /// AND the validators when true, OR them when false.
    #[serde(default = "default_strict")]
    pub strict: bool,
    #[serde(default)]
    pub invert: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            dtype: default_dtype(),
            alias: None,
            default: None,
            converter: Vec::new(),
            validator: Vec::new(),
            strict: default_strict(),
            invert: false,
        }
    }
}

impl FieldConfig {
    /// Builds the field named `name`, resolving every expression.
    ///
    /// The field's severity is the highest `level` among its validators.
    pub fn compile<B: Backend>(&self, name: &str, namespace: &OperationNamespace<B>) -> Result<Field<B>> {
        let dtype: DataType = self
            .dtype
            .parse()
            .map_err(|err| DattrsError::config(format!("field '{name}': {err}")))?;

        let converters = self
            .converter
            .iter()
            .map(|expression| expression.compile(namespace))
            .collect::<Result<Vec<_>>>()?;
        let validators = self
            .validator
            .iter()
            .map(|expression| expression.compile(namespace))
            .collect::<Result<Vec<_>>>()?;
        let severity = self
            .validator
            .iter()
            .map(|expression| expression.level)
            .max()
            .unwrap_or_default();

        let mut field = Field::new(name, dtype)
            .converters(converters)
            .validators(validators)
            .combine(CombineMode::from_strict(self.strict))
            .invert(self.invert)
            .severity(severity);
        if let Some(alias) = &self.alias {
            field = field.alias(alias.as_str());
        }
        if let Some(default) = &self.default {
            field = field.default_value(default.clone());
        }
        Ok(field)
    }
}

/// Top level of a stage file.
#[derive(Debug, Deserialize)]
struct StageFile {
    #[serde(default, with = "ordered")]
    schema: Vec<(String, FieldConfig)>,
}

/// Named conversion-and-validation step of a model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Fields in declaration order.
    #[serde(default, with = "ordered")]
    pub schema: Vec<(String, FieldConfig)>,
}

impl StageConfig {
    /// Stage backed by a stage file.
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        StageConfig {
            name: name.into(),
            path: Some(path.into()),
            schema: Vec::new(),
        }
    }

    /// Returns the stage with its fields filled in from `path`, if any.
    pub fn load(&self) -> Result<StageConfig> {
        let Some(path) = &self.path else {
            return Ok(self.clone());
        };
        if !self.schema.is_empty() {
            return Err(DattrsError::config(format!(
                "stage '{}' declares both an inline schema and a path",
                self.name
            )));
        }

        let file: StageFile = read_document(path)?;
        log::debug!(
            "loaded stage '{}' from '{}' ({} field(s))",
            self.name,
            path.display(),
            file.schema.len()
        );
        Ok(StageConfig {
            name: self.name.clone(),
            path: Some(path.clone()),
            schema: file.schema,
        })
    }

    pub(crate) fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(path) = &self.path {
            if path.is_relative() {
                self.path = Some(base.join(path));
            }
        }
    }

    /// Builds the stage's schema, loading its file first when needed.
    pub fn compile<B: Backend>(&self, namespace: &OperationNamespace<B>) -> Result<Schema<B>> {
        let stage = self.load()?;
        let fields = stage
            .schema
            .iter()
            .map(|(name, field)| field.compile(name, namespace))
            .collect::<Result<Vec<_>>>()?;
        Schema::new(stage.name, fields)
    }
}
