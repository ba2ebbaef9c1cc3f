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

//! # Schema Module
//!
//! An ordered set of [`Field`]s plus two frame-level hooks:
//!
//! - **pre-convert**: runs on the input frame before any field is compiled
//!   against it (typically dropping irrelevant rows)
//! - **post-convert**: runs on the converted frame (typically deriving
//!   columns from converted fields)
//!
//! Both default to the identity. Field order is the output column order of
//! a strict (projecting) conversion.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::describe::FieldDescription;
use crate::dtype::DataType;
use crate::errors::{DattrsError, Result};
use crate::field::Field;

/// Frame-to-frame function run around conversion.
pub type FrameHook<B> =
    Arc<dyn Fn(<B as Backend>::Frame) -> Result<<B as Backend>::Frame> + Send + Sync>;

/// Ordered field declarations plus conversion hooks.
pub struct Schema<B: Backend> {
    name: String,
    fields: Vec<Field<B>>,
    pre_convert: Option<FrameHook<B>>,
    post_convert: Option<FrameHook<B>>,
}

impl<B: Backend> Schema<B> {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder<B> {
        SchemaBuilder::new(name)
    }

    /// Schema without hooks.
    pub fn new(name: impl Into<String>, fields: Vec<Field<B>>) -> Result<Self> {
        Self::builder(name).fields(fields).build()
    }

    /// Plain typed schema from a column-name to type mapping.
    pub fn from_dtypes<I, S>(name: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        let fields = columns
            .into_iter()
            .map(|(column, dtype)| Field::new(column, dtype))
            .collect();
        Self::new(name, fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field<B>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<B>> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Output column names, in declaration order.
    pub fn aliases(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| field.output_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn apply_pre_convert(&self, frame: B::Frame) -> Result<B::Frame> {
        match &self.pre_convert {
            Some(hook) => hook(frame),
            None => Ok(frame),
        }
    }

    pub fn apply_post_convert(&self, frame: B::Frame) -> Result<B::Frame> {
        match &self.post_convert {
            Some(hook) => hook(frame),
            None => Ok(frame),
        }
    }

    pub fn describe(&self) -> Vec<FieldDescription> {
        self.fields.iter().map(FieldDescription::from_field).collect()
    }
}

impl<B: Backend> Clone for Schema<B> {
    fn clone(&self) -> Self {
        Schema {
            name: self.name.clone(),
            fields: self.fields.clone(),
            pre_convert: self.pre_convert.clone(),
            post_convert: self.post_convert.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for Schema<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("pre_convert", &self.pre_convert.is_some())
            .field("post_convert", &self.post_convert.is_some())
            .finish()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<B: Backend> {
    name: String,
    fields: Vec<Field<B>>,
    pre_convert: Option<FrameHook<B>>,
    post_convert: Option<FrameHook<B>>,
}

impl<B: Backend> SchemaBuilder<B> {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            pre_convert: None,
            post_convert: None,
        }
    }

    pub fn field(mut self, field: Field<B>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field<B>>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn pre_convert<F>(mut self, hook: F) -> Self
    where
        F: Fn(B::Frame) -> Result<B::Frame> + Send + Sync + 'static,
    {
        self.pre_convert = Some(Arc::new(hook));
        self
    }

    pub fn post_convert<F>(mut self, hook: F) -> Self
    where
        F: Fn(B::Frame) -> Result<B::Frame> + Send + Sync + 'static,
    {
        self.post_convert = Some(Arc::new(hook));
        self
    }

    /// Finalizes the schema. Field names and aliases must be unique.
    pub fn build(self) -> Result<Schema<B>> {
        let mut names = HashSet::new();
        let mut aliases = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name()) {
                return Err(DattrsError::schema(format!(
                    "schema '{}' declares field '{}' more than once",
                    self.name,
                    field.name()
                )));
            }
            if !aliases.insert(field.output_name()) {
                return Err(DattrsError::schema(format!(
                    "schema '{}' maps more than one field to alias '{}'",
                    self.name,
                    field.output_name()
                )));
            }
        }

        Ok(Schema {
            name: self.name,
            fields: self.fields,
            pre_convert: self.pre_convert,
            post_convert: self.post_convert,
        })
    }
}
