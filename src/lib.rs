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

//! # Dattrs Core Library
//!
//! Declare a tabular schema once, as an ordered set of typed fields with
//! optional defaults, converters and validators, and derive two execution
//! plans from it for any columnar backend:
//!
//! - **conversion** reshapes an input frame into the declared columns
//! - **validation** counts, per field, the rows violating its predicates
//!
//! Dattrs holds no data and evaluates nothing itself. Converters and
//! validators are backend operations looked up by name and applied to
//! backend expression handles; the backend's frame does the work.
//!
//! ## Module Overview
//!
//! - **errors**: `DattrsError` taxonomy and the `Result` alias
//! - **dtype**: declared column types
//! - **backend**: `Backend` and `Frame`, the contracts a columnar engine implements
//! - **namespace**: operation registry, namespaces and bound operations
//! - **step**: converter/validator steps (operations, closures, negation)
//! - **field** / **schema**: declarations
//! - **convert** / **validate**: the two pipelines
//! - **model**: run modes and the `Model` trait
//! - **describe** / **report**: descriptions and outcome rendering
//! - **config**: YAML/JSON declaration front end
//! - **memory**: in-memory reference backend
//! - **testing**: assertion helpers
//!
//! ## Feature Flags
//!
//! - `memory`: the in-memory reference backend (regex, chrono)
//! - `config`: the config front end (serde_yaml)
//! - `full`: both (default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dattrs::prelude::*;
//! use serde_json::json;
//!
//! let ns = MemoryBackend::namespace();
//! let schema = Schema::<MemoryBackend>::new("phonebook", vec![
//!     Field::new("id", DataType::Int16).validator(ns.resolve("is_unique")?),
//!     Field::new("name", DataType::String)
//!         .default_value(json!("Unknown"))
//!         .converter(ns.resolve_path("str.to_uppercase")?),
//! ])?;
//!
//! let frame = MemoryFrame::from_columns(vec![("id", vec![json!(0), json!(1), json!(2), json!(2)])])?;
//! let output = run(&schema, frame, RunMode::ConvertThenValidate)?;
//! report::emit("phonebook", output.validation.as_ref().unwrap());
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns `Result<T, DattrsError>`. Conversion
//! errors abort the pipeline; rows failing validation are reported as
//! [`Outcome::Fail`] values and never raised.

pub mod backend;
pub mod convert;
pub mod describe;
pub mod dtype;
pub mod errors;
pub mod field;
pub mod model;
pub mod namespace;
pub mod report;
pub mod schema;
pub mod step;
pub mod testing;
pub mod validate;

#[cfg(feature = "config")]
pub mod config;
#[cfg(feature = "memory")]
pub mod memory;

pub use backend::{Backend, Frame};
pub use convert::{compile_field, compile_schema, convert, convert_with, ConvertOptions};
pub use describe::FieldDescription;
pub use dtype::{DataType, StructField};
pub use errors::{DattrsError, Result};
pub use field::{CombineMode, DefaultValue, Field, Severity};
pub use model::{run, run_with, Model, RunMode, RunOutput};
pub use namespace::{
    Arguments, BoundOperation, Category, DirectFn, OperationFn, OperationNamespace,
    OperationRegistry, WrappedFn,
};
pub use schema::{FrameHook, Schema, SchemaBuilder};
pub use step::{fold_steps, ExprFn, ExprStep};
pub use validate::{
    build_predicate, validate, validate_field, FieldOutcome, Outcome, ValidationReport,
};

#[cfg(feature = "config")]
pub use config::{
    CompiledModel, ConfigFile, ExpressionConfig, FieldConfig, ModelConfig, ModelRun,
    SourceConfig, StageConfig, StageReport,
};
#[cfg(feature = "memory")]
pub use memory::{MemoryBackend, MemoryExpr, MemoryFrame};

/// Common imports for declaring and running schemas.
pub mod prelude {
    pub use crate::backend::{Backend, Frame};
    pub use crate::convert::{convert, convert_with, ConvertOptions};
    pub use crate::dtype::DataType;
    pub use crate::errors::{DattrsError, Result};
    pub use crate::field::{CombineMode, Field, Severity};
    pub use crate::model::{run, Model, RunMode, RunOutput};
    pub use crate::namespace::{Category, OperationNamespace};
    pub use crate::report;
    pub use crate::schema::Schema;
    pub use crate::step::ExprStep;
    pub use crate::validate::{validate, Outcome, ValidationReport};

    #[cfg(feature = "memory")]
    pub use crate::memory::{MemoryBackend, MemoryExpr, MemoryFrame};
}
