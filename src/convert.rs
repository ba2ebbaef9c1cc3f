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

//! # Conversion Module
//!
//! Compiles each field into one expression and applies all of them to a
//! frame in a single backend call.
//!
//! Per field, in declaration order:
//!
//! 1. **Existence**: a missing column needs a default and becomes a constant
//!    column; an existing column gets its nulls filled when a default is set
//! 2. **Type**: cast to the declared type
//! 3. **Converters**: threaded left to right
//! 4. **Alias**: renamed to the output name
//!
//! Every field expression is compiled before the frame is touched, so a
//! missing default or an unknown operation aborts the conversion without
//! producing any output. Cast failures surface from the single
//! `with_columns` call, which either produces every column or none.

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Frame};
use crate::errors::{DattrsError, Result};
use crate::field::Field;
use crate::schema::Schema;
use crate::step::fold_steps;

/// Conversion switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Project the result onto the schema's aliases, in declaration order.
    #[serde(default)]
    pub strict: bool,
}

impl ConvertOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Builds the final expression for one field.
///
/// `exists` tells whether the input frame has a column named after the field.
pub fn compile_field<B: Backend>(field: &Field<B>, exists: bool) -> Result<B::Expr> {
    let base = match (exists, field.default()) {
        (false, None) => return Err(DattrsError::missing_default(field.name())),
        (false, Some(default)) => B::lit(&default.resolve()),
        (true, Some(default)) => B::fill_null(B::col(field.name()), &default.resolve()),
        (true, None) => B::col(field.name()),
    };

    let typed = B::cast(base, field.dtype());
    let converted = fold_steps(field.converter_steps(), typed)?;

    log::debug!(
        "compiled field '{}' -> '{}' ({}, {} converter(s), column {})",
        field.name(),
        field.output_name(),
        field.dtype(),
        field.converter_steps().len(),
        if exists { "present" } else { "defaulted" }
    );

    Ok(B::alias(converted, field.output_name()))
}

/// Compiles every field of `schema` against the given input columns.
pub fn compile_schema<B: Backend>(
    schema: &Schema<B>,
    columns: &[String],
) -> Result<Vec<(String, B::Expr)>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let exists = columns.iter().any(|column| column == field.name());
            compile_field(field, exists).map(|expr| (field.output_name().to_string(), expr))
        })
        .collect()
}

/// Converts `frame` with default options.
pub fn convert<B: Backend>(schema: &Schema<B>, frame: B::Frame) -> Result<B::Frame> {
    convert_with(schema, frame, ConvertOptions::default())
}

/// Runs the pre-hook, applies every field expression, optionally projects,
/// then runs the post-hook.
pub fn convert_with<B: Backend>(
    schema: &Schema<B>,
    frame: B::Frame,
    options: ConvertOptions,
) -> Result<B::Frame> {
    let frame = schema.apply_pre_convert(frame)?;
    let plan = compile_schema(schema, &frame.columns())?;

    log::info!(
        "converting {} row(s) with schema '{}' ({} field(s), strict: {})",
        frame.row_count(),
        schema.name(),
        plan.len(),
        options.strict
    );

    let converted = frame
        .with_columns(plan)
        .map_err(|err| name_cast_field(schema, err))?;
    let converted = if options.strict {
        converted.select(&schema.aliases())?
    } else {
        converted
    };

    schema.apply_post_convert(converted)
}

/// Backends report cast failures against the output column; cast errors
/// name the declaring field instead.
fn name_cast_field<B: Backend>(schema: &Schema<B>, err: DattrsError) -> DattrsError {
    match err {
        DattrsError::Cast {
            field,
            source_type,
            target_type,
            message,
        } => {
            let field = schema
                .fields()
                .iter()
                .find(|declared| declared.output_name() == field)
                .map(|declared| declared.name().to_string())
                .unwrap_or(field);
            DattrsError::Cast {
                field,
                source_type,
                target_type,
                message,
            }
        }
        other => other,
    }
}
