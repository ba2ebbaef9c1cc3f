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

//! # Report Module
//!
//! Presentation of validation outcomes. The pipelines only return values;
//! this is the one place that turns them into text and log records.
//!
//! ```text
//! Field: id (id) | [FAILURE] There are 2 rows that failed.
//! Field: name (full_name) | [SUCCESS] All rows passed.
//! ```

use std::fmt;

use crate::validate::{FieldOutcome, Outcome, ValidationReport};

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => f.write_str("[SUCCESS] All rows passed."),
            Outcome::Fail { count } => {
                write!(f, "[FAILURE] There are {count} rows that failed.")
            }
        }
    }
}

impl fmt::Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field: {} ({}) | {}", self.field, self.alias, self.outcome)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.outcomes.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Renders one line per checked field.
pub fn render(report: &ValidationReport) -> Vec<String> {
    report.outcomes.iter().map(ToString::to_string).collect()
}

/// Logs every line of `report` under `stage` and returns the lines.
///
/// Passing fields go to `info`, failing fields to `warn`, skipped fields to
/// `debug`.
pub fn emit(stage: &str, report: &ValidationReport) -> Vec<String> {
    log::info!(
        "[{stage}] schema '{}': {} field(s) checked, {} failing",
        report.schema,
        report.len(),
        report.failures().count()
    );

    let lines = render(report);
    for (entry, line) in report.outcomes.iter().zip(&lines) {
        if entry.outcome.is_pass() {
            log::info!("[{stage}] {line}");
        } else {
            log::warn!("[{stage}] {line} (severity: {:?})", entry.severity);
        }
    }
    for field in &report.skipped {
        log::debug!("[{stage}] Field: {field} | skipped, column not present");
    }
    lines
}
