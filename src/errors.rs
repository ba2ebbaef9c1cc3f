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

//! # Dattrs Error Module
//!
//! This module defines the error types used throughout Dattrs for consistent
//! error handling and reporting.
//!
//! ## Error Categories
//!
//! - **MissingDefault**: a declared field is absent from the input and has no
//!   default; conversion aborts before any column is emitted
//! - **Cast**: a value is not representable in the declared type
//! - **UnknownOperation**: a converter/validator name is not exposed by the
//!   backend's operation registry
//! - **InvalidArguments**: a bound operation received arguments it cannot use
//! - **ValidationSetup**: building or evaluating a field predicate failed
//! - **Schema**: duplicate field names or aliases, unparsable types
//! - **Frame**: any other backend evaluation failure
//! - **Validation**: a caller asked for hard-fail semantics on a report with
//!   failures
//! - **Config**: malformed declaration files
//! - **Io / Serde / Internal**: plumbing
//!
//! A validation *failure* (rows violating a predicate) is not an error: it is
//! an [`Outcome`](crate::validate::Outcome) value.
//!
//! ## Usage
//!
//! ```rust
//! use dattrs::errors::{DattrsError, Result};
//!
//! fn resolve_default(field: &str, default: Option<i64>) -> Result<i64> {
//!     default.ok_or_else(|| DattrsError::missing_default(field))
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Dattrs.
pub type Result<T> = std::result::Result<T, DattrsError>;

/// Canonical error enumeration for Dattrs.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum DattrsError {
    /// Field absent from the input frame and no default declared.
    #[error("field '{field}' does not exist in the input and has no default")]
    MissingDefault { field: String },

    /// Value not representable in the declared type.
    #[error("cannot cast field '{field}' from {source_type} to {target_type}: {message}")]
    Cast {
        field: String,
        source_type: String,
        target_type: String,
        message: String,
    },

    /// Operation name not exposed by the namespace it was looked up in.
    #[error("unknown operation '{name}' in namespace '{namespace}'")]
    UnknownOperation { name: String, namespace: String },

    /// Operation resolved but its bound arguments are unusable.
    #[error("operation '{operation}' received invalid arguments: {message}")]
    InvalidArguments { operation: String, message: String },

    /// Constructing or evaluating a field predicate raised.
    #[error("unable to perform validation for '{field}': {message}")]
    ValidationSetup { field: String, message: String },

    /// Malformed schema declaration.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Backend evaluation failure other than a cast.
    #[error("frame error: {message}")]
    Frame { message: String },

    /// Raised only when a caller requests hard-fail semantics.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Malformed declaration file.
    #[error("config error: {message}")]
    Config { message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for DattrsError {
    fn from(err: io::Error) -> Self {
        DattrsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DattrsError {
    fn from(err: serde_json::Error) -> Self {
        DattrsError::Serde(err.to_string())
    }
}

#[cfg(feature = "config")]
impl From<serde_yaml::Error> for DattrsError {
    fn from(err: serde_yaml::Error) -> Self {
        DattrsError::Serde(err.to_string())
    }
}

impl DattrsError {
    /// Helper to construct missing-default errors.
    pub fn missing_default(field: impl Into<String>) -> Self {
        DattrsError::MissingDefault {
            field: field.into(),
        }
    }

    /// Helper to construct cast errors.
    pub fn cast(
        field: impl Into<String>,
        source_type: impl Into<String>,
        target_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DattrsError::Cast {
            field: field.into(),
            source_type: source_type.into(),
            target_type: target_type.into(),
            message: message.into(),
        }
    }

    /// Helper to construct unknown-operation errors.
    pub fn unknown_operation(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        DattrsError::UnknownOperation {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Helper to construct argument errors.
    pub fn invalid_arguments(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DattrsError::InvalidArguments {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Helper to construct validation setup errors.
    pub fn validation_setup(field: impl Into<String>, message: impl Into<String>) -> Self {
        DattrsError::ValidationSetup {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema<T: Into<String>>(message: T) -> Self {
        DattrsError::Schema {
            message: message.into(),
        }
    }

    /// Helper to construct frame errors.
    pub fn frame<T: Into<String>>(message: T) -> Self {
        DattrsError::Frame {
            message: message.into(),
        }
    }

    /// Helper to construct hard-fail validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        DattrsError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct config errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        DattrsError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        DattrsError::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_error_names_field_and_types() {
        let err = DattrsError::cast("id", "String", "Int16", "'abc' is not an integer");
        let text = err.to_string();
        assert!(text.contains("'id'"));
        assert!(text.contains("String"));
        assert!(text.contains("Int16"));
    }

    #[test]
    fn errors_round_trip_through_json() {
        let err = DattrsError::missing_default("name");
        let json = serde_json::to_string(&err).unwrap();
        let back: DattrsError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
