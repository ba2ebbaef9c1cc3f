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

//! # Field Module
//!
//! One column's contract: name, declared type, optional default, converter
//! steps, validator steps, output alias, and how validators combine.
//!
//! ```rust,ignore
//! let ns = MemoryBackend::namespace();
//! let name = Field::new("name", DataType::String)
//!     .default_value(json!("Unknown"))
//!     .converter(ns.resolve_path("str.to_uppercase")?)
//!     .validator(!ns.resolve("is_null")?);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::Backend;
use crate::dtype::DataType;
use crate::step::ExprStep;

/// Default used when a column is missing or null.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Zero-argument producer, invoked once per conversion.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, DefaultValue::Factory(_))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Literal(value)
    }
}

/// How a field's validator predicates are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Every predicate must hold (AND).
    #[default]
    Strict,
    /// At least one predicate must hold (OR).
    Lenient,
}

impl CombineMode {
    pub const fn from_strict(strict: bool) -> Self {
        if strict {
            CombineMode::Strict
        } else {
            CombineMode::Lenient
        }
    }
}

/// How serious a failing field is, carried through to reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
    Critical,
}

/// Contract for a single column.
pub struct Field<B: Backend> {
    name: String,
    dtype: DataType,
    alias: String,
    default: Option<DefaultValue>,
    converters: Vec<ExprStep<B>>,
    validators: Vec<ExprStep<B>>,
    combine: CombineMode,
    invert: bool,
    severity: Severity,
}

impl<B: Backend> Field<B> {
    /// Declares a field; the alias starts out equal to `name`.
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        let name = name.into();
        Field {
            alias: name.clone(),
            name,
            dtype,
            default: None,
            converters: Vec::new(),
            validators: Vec::new(),
            combine: CombineMode::Strict,
            invert: false,
            severity: Severity::Warning,
        }
    }

    /// Output column name. An empty alias keeps the field name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !alias.is_empty() {
            self.alias = alias;
        }
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Default computed lazily at conversion time.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    pub fn with_default(mut self, default: Option<DefaultValue>) -> Self {
        self.default = default;
        self
    }

    /// Appends a converter step.
    pub fn converter(mut self, step: impl Into<ExprStep<B>>) -> Self {
        self.converters.push(step.into());
        self
    }

    pub fn converters<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExprStep<B>>,
    {
        self.converters.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Appends a validator step.
    pub fn validator(mut self, step: impl Into<ExprStep<B>>) -> Self {
        self.validators.push(step.into());
        self
    }

    pub fn validators<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExprStep<B>>,
    {
        self.validators.extend(steps.into_iter().map(Into::into));
        self
    }

    pub fn combine(mut self, combine: CombineMode) -> Self {
        self.combine = combine;
        self
    }

    /// Shorthand for [`CombineMode::Lenient`].
    pub fn lenient(self) -> Self {
        self.combine(CombineMode::Lenient)
    }

    /// Negates the combined predicate, flipping what counts as passing.
    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn output_name(&self) -> &str {
        &self.alias
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn converter_steps(&self) -> &[ExprStep<B>] {
        &self.converters
    }

    pub fn validator_steps(&self) -> &[ExprStep<B>] {
        &self.validators
    }

    pub fn has_validator(&self) -> bool {
        !self.validators.is_empty()
    }

    pub fn combine_mode(&self) -> CombineMode {
        self.combine
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn severity_level(&self) -> Severity {
        self.severity
    }
}

impl<B: Backend> Clone for Field<B> {
    fn clone(&self) -> Self {
        Field {
            name: self.name.clone(),
            dtype: self.dtype.clone(),
            alias: self.alias.clone(),
            default: self.default.clone(),
            converters: self.converters.clone(),
            validators: self.validators.clone(),
            combine: self.combine,
            invert: self.invert,
            severity: self.severity,
        }
    }
}

impl<B: Backend> fmt::Debug for Field<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("dtype", &self.dtype)
            .field("alias", &self.alias)
            .field("default", &self.default)
            .field("converters", &self.converters)
            .field("validators", &self.validators)
            .field("combine", &self.combine)
            .field("invert", &self.invert)
            .field("severity", &self.severity)
            .finish()
    }
}
