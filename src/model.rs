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

//! # Model Module
//!
//! Orchestration of conversion and validation over one schema.
//!
//! ## Run Modes
//!
//! - **Convert**: conversion only
//! - **Validate**: validation of the frame as given
//! - **ConvertThenValidate**: convert, then validate the converted frame
//! - **ValidateConvertValidate**: validate the raw input, convert, validate
//!   again
//!
//! No mode raises because rows failed validation. Reports are returned next
//! to the frame and callers decide what a failure means
//! ([`ValidationReport::ensure_passed`] for hard-fail semantics).
//!
//! ## Declaring Models
//!
//! ```rust,ignore
//! struct Phonebook;
//!
//! impl Model for Phonebook {
//!     type Backend = MemoryBackend;
//!
//!     fn schema() -> Result<Schema<MemoryBackend>> {
//!         let ns = MemoryBackend::namespace();
//!         Schema::new("phonebook", vec![
//!             Field::new("id", DataType::Int16).validator(ns.resolve("is_unique")?),
//!         ])
//!     }
//! }
//!
//! let output = Phonebook::pipe(frame)?;
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::convert::{convert_with, ConvertOptions};
use crate::errors::{DattrsError, Result};
use crate::schema::Schema;
use crate::validate::{validate, ValidationReport};

/// Which pipelines run, in which order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Convert,
    Validate,
    #[default]
    ConvertThenValidate,
    ValidateConvertValidate,
}

impl RunMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RunMode::Convert => "convert",
            RunMode::Validate => "validate",
            RunMode::ConvertThenValidate => "convert_then_validate",
            RunMode::ValidateConvertValidate => "validate_convert_validate",
        }
    }

    pub const fn converts(&self) -> bool {
        !matches!(self, RunMode::Validate)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = DattrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "convert" => Ok(RunMode::Convert),
            "validate" => Ok(RunMode::Validate),
            "convert_then_validate" => Ok(RunMode::ConvertThenValidate),
            "validate_convert_validate" => Ok(RunMode::ValidateConvertValidate),
            other => Err(DattrsError::config(format!("unknown run mode '{other}'"))),
        }
    }
}

/// Frame produced by [`run`] plus whatever reports the mode produced.
#[derive(Clone, Debug)]
pub struct RunOutput<F> {
    pub frame: F,
    /// Report over the raw input (`ValidateConvertValidate` only).
    pub pre_validation: Option<ValidationReport>,
    /// Report over the returned frame.
    pub validation: Option<ValidationReport>,
}

impl<F> RunOutput<F> {
    fn frame_only(frame: F) -> Self {
        RunOutput {
            frame,
            pre_validation: None,
            validation: None,
        }
    }

    /// True when every produced report passed.
    pub fn passed(&self) -> bool {
        self.pre_validation
            .iter()
            .chain(self.validation.iter())
            .all(ValidationReport::passed)
    }

    pub fn into_frame(self) -> F {
        self.frame
    }
}

/// Runs `schema` over `frame` in `mode` with default conversion options.
pub fn run<B: Backend>(
    schema: &Schema<B>,
    frame: B::Frame,
    mode: RunMode,
) -> Result<RunOutput<B::Frame>> {
    run_with(schema, frame, mode, ConvertOptions::default())
}

pub fn run_with<B: Backend>(
    schema: &Schema<B>,
    frame: B::Frame,
    mode: RunMode,
    options: ConvertOptions,
) -> Result<RunOutput<B::Frame>> {
    log::info!("running schema '{}' in mode {}", schema.name(), mode);

    let output = match mode {
        RunMode::Convert => RunOutput::frame_only(convert_with(schema, frame, options)?),
        RunMode::Validate => {
            let report = validate(schema, &frame)?;
            RunOutput {
                frame,
                pre_validation: None,
                validation: Some(report),
            }
        }
        RunMode::ConvertThenValidate => {
            let frame = convert_with(schema, frame, options)?;
            let report = validate(schema, &frame)?;
            RunOutput {
                frame,
                pre_validation: None,
                validation: Some(report),
            }
        }
        RunMode::ValidateConvertValidate => {
            let pre = validate(schema, &frame)?;
            let frame = convert_with(schema, frame, options)?;
            let post = validate(schema, &frame)?;
            RunOutput {
                frame,
                pre_validation: Some(pre),
                validation: Some(post),
            }
        }
    };

    log::info!(
        "schema '{}' finished ({}): {}",
        schema.name(),
        mode,
        if output.passed() { "passed" } else { "failures reported" }
    );
    Ok(output)
}

/// Type-level declaration front end.
///
/// Implementors only describe their schema; conversion, validation and the
/// combined pipeline are provided.
pub trait Model {
    type Backend: Backend;

    fn schema() -> Result<Schema<Self::Backend>>;

    fn convert(frame: <Self::Backend as Backend>::Frame) -> Result<<Self::Backend as Backend>::Frame> {
        convert_with(&Self::schema()?, frame, ConvertOptions::default())
    }

    fn validate(frame: &<Self::Backend as Backend>::Frame) -> Result<ValidationReport> {
        validate(&Self::schema()?, frame)
    }

    /// Converts, then validates the converted frame.
    fn pipe(
        frame: <Self::Backend as Backend>::Frame,
    ) -> Result<RunOutput<<Self::Backend as Backend>::Frame>> {
        run(&Self::schema()?, frame, RunMode::ConvertThenValidate)
    }
}
