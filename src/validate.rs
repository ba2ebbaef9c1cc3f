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

//! # Validation Module
//!
//! Compiles each field's validators into one predicate over the field's
//! output column and counts the rows that violate it.
//!
//! Rather than checking that every row passes, the frame is filtered for
//! `NOT predicate`: an empty result is a pass, anything else is a failure
//! carrying the number of violating rows. Rows where the predicate is null
//! are neither.
//!
//! Failures are values in a [`ValidationReport`], never errors. An error is
//! only returned when a predicate cannot be built or evaluated, and it names
//! the field ([`DattrsError::ValidationSetup`]).

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Frame};
use crate::errors::{DattrsError, Result};
use crate::field::{CombineMode, Field, Severity};
use crate::schema::Schema;

/// Result of checking one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    /// `count` rows violate the field's predicate.
    Fail { count: usize },
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn failed_rows(&self) -> usize {
        match self {
            Outcome::Pass => 0,
            Outcome::Fail { count } => *count,
        }
    }
}

/// Outcome of one field together with its identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub field: String,
    pub alias: String,
    pub outcome: Outcome,
    pub severity: Severity,
}

/// Per-field outcomes of one validation run, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema: String,
    pub outcomes: Vec<FieldOutcome>,
    /// Fields with validators whose output column was absent.
    pub skipped: Vec<String>,
}

impl ValidationReport {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| &entry.outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when no checked field has violating rows.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|entry| entry.outcome.is_pass())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|entry| !entry.outcome.is_pass())
    }

    pub fn total_failed_rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|entry| entry.outcome.failed_rows())
            .sum()
    }

    /// Hard-fail view of the report for callers that want one.
    pub fn ensure_passed(&self) -> Result<()> {
        let failed: Vec<String> = self
            .failures()
            .map(|entry| format!("{} ({} rows)", entry.field, entry.outcome.failed_rows()))
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(DattrsError::validation(format!(
                "schema '{}' has failing fields: {}",
                self.schema,
                failed.join(", ")
            )))
        }
    }
}

/// Combines a field's validators into the predicate rows must satisfy.
pub fn build_predicate<B: Backend>(field: &Field<B>, column: B::Expr) -> Result<B::Expr> {
    let (first, rest) = field.validator_steps().split_first().ok_or_else(|| {
        DattrsError::validation_setup(field.name(), "field declares no validators")
    })?;

    let combine: fn(B::Expr, B::Expr) -> B::Expr = match field.combine_mode() {
        CombineMode::Strict => B::and,
        CombineMode::Lenient => B::or,
    };

    let mut predicate = first.apply(column.clone())?;
    for step in rest {
        predicate = combine(predicate, step.apply(column.clone())?);
    }

    Ok(if field.is_inverted() {
        B::not(predicate)
    } else {
        predicate
    })
}

/// Checks one field against `frame`, reading its output column.
pub fn validate_field<B: Backend>(field: &Field<B>, frame: &B::Frame) -> Result<Outcome> {
    let setup_error = |err: DattrsError| DattrsError::validation_setup(field.name(), err.to_string());

    let predicate = build_predicate(field, B::col(field.output_name())).map_err(setup_error)?;
    let violations = frame.filter(&B::not(predicate)).map_err(setup_error)?;

    Ok(if violations.is_empty() {
        Outcome::Pass
    } else {
        Outcome::Fail {
            count: violations.row_count(),
        }
    })
}

/// Validates every field of `schema` that has validators and whose output
/// column exists in `frame`.
pub fn validate<B: Backend>(schema: &Schema<B>, frame: &B::Frame) -> Result<ValidationReport> {
    let columns = frame.columns();
    let mut report = ValidationReport::new(schema.name());

    for field in schema.fields() {
        if !field.has_validator() {
            continue;
        }
        if !columns.iter().any(|column| column == field.output_name()) {
            log::debug!(
                "skipping validation of '{}': column '{}' not in frame",
                field.name(),
                field.output_name()
            );
            report.skipped.push(field.name().to_string());
            continue;
        }

        let outcome = validate_field(field, frame)?;
        report.outcomes.push(FieldOutcome {
            field: field.name().to_string(),
            alias: field.output_name().to_string(),
            outcome,
            severity: field.severity_level(),
        });
    }

    Ok(report)
}
