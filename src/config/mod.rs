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

//! # Config Front End
//!
//! Declares schemas in YAML or JSON files instead of code.
//!
//! ## Layout
//!
//! ```yaml
//! metadata:
//!   analytic: { name: phonebook, description: Contact hygiene }
//! runtime:
//!   logging: { directory: logs, level: INFO }
//!   output: { directory: out }
//! models:
//!   - name: contacts
//!     sources:
//!       - { path: data/contacts.csv, separator: ";" }
//!     stages:
//!       - name: clean
//!         schema:
//!           id:
//!             dtype: int16
//!             validator:
//!               - { function: is_unique, level: error }
//!           name:
//!             default: Unknown
//!             converter:
//!               - { function: str.to_uppercase }
//! ```
//!
//! A stage either carries its `schema` inline or points at a stage file
//! (`path`) whose top-level `schema` mapping holds the fields. Field order
//! in the mapping is declaration order.
//!
//! Compiling resolves every `function` against an
//! [`OperationNamespace`](crate::namespace::OperationNamespace), so unknown
//! operation names fail before any frame is read.

mod file;
mod model;
mod stage;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::errors::{DattrsError, Result};

pub use file::{Analytic, ConfigFile, LoggingConfig, Metadata, OutputConfig, Runtime};
pub use model::{CompiledModel, ModelConfig, ModelRun, SourceConfig, StageReport};
pub use stage::{ExpressionConfig, FieldConfig, StageConfig};

/// Reads a YAML (`.yaml`, `.yml`) or JSON (`.json`) document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|err| {
        DattrsError::config(format!("cannot read '{}': {err}", path.display()))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    log::debug!("reading {} document '{}'", extension, path.display());

    match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|err| {
            DattrsError::config(format!("invalid JSON in '{}': {err}", path.display()))
        }),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|err| {
            DattrsError::config(format!("invalid YAML in '{}': {err}", path.display()))
        }),
        other => Err(DattrsError::config(format!(
            "unsupported file extension '{other}' for '{}' (expected yaml, yml or json)",
            path.display()
        ))),
    }
}

/// Serde adapter keeping a mapping's entries in document order.
pub(crate) mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(entries: &Vec<(String, T)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }

    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a mapping")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }
}
