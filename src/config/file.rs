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
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{CompiledModel, ModelConfig};
use super::read_document;
use crate::backend::Backend;
use crate::errors::{DattrsError, Result};
use crate::namespace::OperationNamespace;

/// Who owns an analytic and what it is for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub analytic: Analytic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// `INFO`, `WARNING`, `ERROR` or `CRITICAL`.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "INFO".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            directory: PathBuf::from("logs"),
            level: default_level(),
        }
    }
}

impl LoggingConfig {
    /// Maps the configured level onto the `log` crate's filter.
    pub fn level_filter(&self) -> Result<LevelFilter> {
        match self.level.to_ascii_lowercase().as_str() {
            "warning" => Ok(LevelFilter::Warn),
            "critical" => Ok(LevelFilter::Error),
            other => LevelFilter::from_str(other).map_err(|_| {
                DattrsError::config(format!("unknown logging level '{}'", self.level))
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("output"),
            overwrite: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Execution environment declarations, carried through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub compute: Map<String, Value>,
}

/// Top-level declaration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl ConfigFile {
    /// Reads a config file. Relative model and stage paths are resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: ConfigFile = read_document(path)?;
        if let Some(base) = path.parent() {
            for model in &mut config.models {
                model.resolve_relative_to(base);
            }
        }
        log::info!(
            "loaded config '{}' with {} model(s)",
            path.display(),
            config.models.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|err| DattrsError::config(format!("invalid YAML: {err}")))
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| DattrsError::config(format!("invalid JSON: {err}")))
    }

    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Compiles every model against `namespace`.
    pub fn compile<B: Backend>(&self, namespace: &OperationNamespace<B>) -> Result<Vec<CompiledModel<B>>> {
        self.models.iter().map(|model| model.compile(namespace)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
metadata:
  analytic:
    name: phonebook
    description: Contact hygiene
    tags: [contacts, pii]
runtime:
  logging:
    directory: logs
    level: WARNING
  output:
    directory: out
  compute:
    python_version: "3.12"
models:
  - name: contacts
    sources:
      - path: contacts.csv
    stages:
      - name: clean
        schema:
          id:
            dtype: int16
"#;

    #[test]
    fn parses_every_section() {
        let config = ConfigFile::from_yaml_str(CONFIG).unwrap();
        assert_eq!(config.metadata.analytic.name, "phonebook");
        assert_eq!(config.metadata.analytic.tags, vec!["contacts", "pii"]);
        assert_eq!(config.runtime.logging.level_filter().unwrap(), LevelFilter::Warn);
        assert!(!config.runtime.output.overwrite);
        assert_eq!(config.runtime.compute.len(), 1);
        assert_eq!(config.model("contacts").unwrap().stages[0].schema.len(), 1);
    }

    #[test]
    fn unknown_levels_are_config_errors() {
        let logging = LoggingConfig {
            level: "LOUD".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(logging.level_filter(), Err(DattrsError::Config { .. })));
    }
}
