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

//! Serializable descriptions of declared fields.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::field::{CombineMode, Field, Severity};

/// What a field declares, without its closures or backend handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub alias: String,
    /// Display name of the declared type.
    pub dtype: String,
    pub has_default: bool,
    /// Step names in application order (`str.to_uppercase`, `~is_null`, ...).
    pub converters: Vec<String>,
    pub validators: Vec<String>,
    pub combine: CombineMode,
    pub invert: bool,
    pub severity: Severity,
}

impl FieldDescription {
    pub fn from_field<B: Backend>(field: &Field<B>) -> Self {
        FieldDescription {
            name: field.name().to_string(),
            alias: field.output_name().to_string(),
            dtype: field.dtype().display_name(),
            has_default: field.default().is_some(),
            converters: field.converter_steps().iter().map(|step| step.name()).collect(),
            validators: field.validator_steps().iter().map(|step| step.name()).collect(),
            combine: field.combine_mode(),
            invert: field.is_inverted(),
            severity: field.severity_level(),
        }
    }
}
