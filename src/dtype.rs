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

//! Declared column types.
//!
//! A [`DataType`] is what a field is cast to during conversion. Backends map
//! it onto their own physical types; the names accepted by
//! [`DataType::from_str`] are the ones used in stage files
//! (`"int16"`, `"string"`, `"list[string]"`, `"struct{a: int64}"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DattrsError;

/// Named member of a [`DataType::Struct`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub dtype: DataType,
}

impl StructField {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// Data type a field is declared with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Only nulls.
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// UTF-8 string.
    String,
    /// Calendar date.
    Date,
    /// Date and time without timezone.
    Datetime,
    /// Strings drawn from a small set of categories.
    Categorical,
    /// Variable-length list of one element type.
    List(Box<DataType>),
    /// Record with named members.
    Struct(Vec<StructField>),
}

impl DataType {
    pub fn list(inner: DataType) -> Self {
        Self::List(Box::new(inner))
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Datetime)
    }

    /// Inclusive value range of an integer type.
    pub const fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::UInt8 => Some((0, u8::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Get the display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            Self::Null => "Null".to_string(),
            Self::Boolean => "Boolean".to_string(),
            Self::Int8 => "Int8".to_string(),
            Self::Int16 => "Int16".to_string(),
            Self::Int32 => "Int32".to_string(),
            Self::Int64 => "Int64".to_string(),
            Self::UInt8 => "UInt8".to_string(),
            Self::UInt16 => "UInt16".to_string(),
            Self::UInt32 => "UInt32".to_string(),
            Self::UInt64 => "UInt64".to_string(),
            Self::Float32 => "Float32".to_string(),
            Self::Float64 => "Float64".to_string(),
            Self::String => "String".to_string(),
            Self::Date => "Date".to_string(),
            Self::Datetime => "Datetime".to_string(),
            Self::Categorical => "Categorical".to_string(),
            Self::List(inner) => format!("List({})", inner.display_name()),
            Self::Struct(fields) => {
                let members = fields
                    .iter()
                    .map(|field| format!("{}: {}", field.name, field.dtype.display_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Struct{{{members}}}")
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DataType {
    type Err = DattrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let lowered = text.to_ascii_lowercase();

        if let Some(inner) = strip_wrapped(&lowered, "list", '[', ']')
            .or_else(|| strip_wrapped(&lowered, "list", '<', '>'))
            .or_else(|| strip_wrapped(&lowered, "list", '(', ')'))
        {
            return Ok(Self::list(inner.parse()?));
        }

        if let Some(body) = strip_wrapped(text, "struct", '{', '}')
            .or_else(|| strip_wrapped(text, "Struct", '{', '}'))
        {
            let mut fields = Vec::new();
            for member in split_top_level(body) {
                let (name, dtype) = member.split_once(':').ok_or_else(|| {
                    DattrsError::schema(format!("struct member '{member}' must be 'name: type'"))
                })?;
                fields.push(StructField::new(name.trim(), dtype.parse()?));
            }
            return Ok(Self::Struct(fields));
        }

        let dtype = match lowered.as_str() {
            "null" => Self::Null,
            "bool" | "boolean" => Self::Boolean,
            "int8" | "i8" => Self::Int8,
            "int16" | "i16" => Self::Int16,
            "int32" | "i32" => Self::Int32,
            "int" | "int64" | "i64" | "integer" => Self::Int64,
            "uint8" | "u8" => Self::UInt8,
            "uint16" | "u16" => Self::UInt16,
            "uint32" | "u32" => Self::UInt32,
            "uint64" | "u64" => Self::UInt64,
            "float" | "float32" | "f32" => Self::Float32,
            "double" | "float64" | "f64" => Self::Float64,
            "string" | "str" | "utf8" => Self::String,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::Datetime,
            "categorical" | "category" | "cat" => Self::Categorical,
            _ => return Err(DattrsError::schema(format!("unknown data type '{text}'"))),
        };
        Ok(dtype)
    }
}

fn strip_wrapped<'a>(text: &'a str, head: &str, open: char, close: char) -> Option<&'a str> {
    text.strip_prefix(head)?
        .trim_start()
        .strip_prefix(open)?
        .strip_suffix(close)
}

/// Splits on commas that are not nested inside brackets.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '[' | '<' | '(' | '{' => depth += 1,
            ']' | '>' | ')' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts.into_iter().filter(|part| !part.is_empty()).collect()
}
