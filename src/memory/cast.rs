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

//! Strict cell casts and type inference for JSON cells.
//!
//! Casts never coerce silently: a value that is not representable in the
//! target type (overflow, fractional integers, unparsable text) is an error.
//! Nulls cast to null in every type.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

use crate::dtype::{DataType, StructField};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Type of a single cell; `Null` for null cells.
pub(crate) fn infer_value(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_f64() => DataType::Float64,
        Value::Number(_) => DataType::Int64,
        Value::String(_) => DataType::String,
        Value::Array(items) => DataType::list(infer_column(items)),
        Value::Object(members) => DataType::Struct(
            members
                .iter()
                .map(|(name, member)| StructField::new(name.clone(), infer_value(member)))
                .collect(),
        ),
    }
}

/// Common type of a column of cells. Integers widen to floats when mixed;
/// any other disagreement keeps the first non-null type.
pub(crate) fn infer_column(values: &[Value]) -> DataType {
    values
        .iter()
        .map(infer_value)
        .fold(DataType::Null, |acc, next| match (acc, next) {
            (DataType::Null, next) => next,
            (acc, DataType::Null) => acc,
            (DataType::Int64, DataType::Float64) => DataType::Float64,
            (acc, _) => acc,
        })
}

/// Casts one cell to `target`.
pub(crate) fn cast_value(value: &Value, target: &DataType) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match target {
        DataType::Null => Err(format!("{value} is not null")),
        DataType::Boolean => to_bool(value).map(Value::Bool),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let integer = to_integer(value)?;
            match target.integer_bounds() {
                Some((min, max)) if integer < min || integer > max => {
                    Err(format!("{integer} is out of range for {target}"))
                }
                _ => Ok(integer_value(integer)),
            }
        }
        DataType::Float32 => {
            let float = to_float(value)?;
            if float.abs() > f64::from(f32::MAX) {
                return Err(format!("{float} is out of range for {target}"));
            }
            float_value(float)
        }
        DataType::Float64 => float_value(to_float(value)?),
        DataType::String | DataType::Categorical => match value {
            Value::String(text) => Ok(Value::String(text.clone())),
            Value::Bool(flag) => Ok(Value::String(flag.to_string())),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            _ => Err(format!("nested value {value} has no text form")),
        },
        DataType::Date => {
            let date = match value {
                Value::String(text) => parse_date(text, None)?,
                _ => return Err(format!("{value} is not a date")),
            };
            Ok(Value::String(date.format(DATE_FORMAT).to_string()))
        }
        DataType::Datetime => {
            let datetime = match value {
                Value::String(text) => parse_datetime(text, None)?,
                _ => return Err(format!("{value} is not a datetime")),
            };
            Ok(Value::String(datetime.format(DATETIME_FORMAT).to_string()))
        }
        DataType::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| cast_value(item, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(format!("{value} is not a list")),
        },
        DataType::Struct(fields) => match value {
            Value::Object(members) => {
                let mut out = Map::new();
                for field in fields {
                    let member = members.get(&field.name).unwrap_or(&Value::Null);
                    let cast = cast_value(member, &field.dtype)
                        .map_err(|message| format!("member '{}': {message}", field.name))?;
                    out.insert(field.name.clone(), cast);
                }
                Ok(Value::Object(out))
            }
            _ => Err(format!("{value} is not a struct")),
        },
    }
}

fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("{number} is not a boolean")),
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(format!("'{text}' is not a boolean")),
        },
        _ => Err(format!("{value} is not a boolean")),
    }
}

fn to_integer(value: &Value) -> Result<i128, String> {
    match value {
        Value::Bool(flag) => Ok(i128::from(*flag)),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(i128::from(integer))
            } else if let Some(integer) = number.as_u64() {
                Ok(i128::from(integer))
            } else {
                number
                    .as_f64()
                    .and_then(whole_float)
                    .ok_or_else(|| format!("{number} is not an integer"))
            }
        }
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i128>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_float))
                .ok_or_else(|| format!("'{text}' is not an integer"))
        }
        _ => Err(format!("{value} is not an integer")),
    }
}

fn whole_float(float: f64) -> Option<i128> {
    (float.is_finite() && float.fract() == 0.0 && float.abs() < 1e38).then_some(float as i128)
}

fn to_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| format!("{number} is not a float")),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{text}' is not a float")),
        _ => Err(format!("{value} is not a float")),
    }
}

pub(crate) fn integer_value(integer: i128) -> Value {
    if let Ok(signed) = i64::try_from(integer) {
        Value::Number(Number::from(signed))
    } else if let Ok(unsigned) = u64::try_from(integer) {
        Value::Number(Number::from(unsigned))
    } else {
        Value::Null
    }
}

pub(crate) fn float_value(float: f64) -> Result<Value, String> {
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| format!("{float} is not a finite float"))
}

/// Parses a date, with an explicit chrono format or the accepted defaults.
pub(crate) fn parse_date(text: &str, format: Option<&str>) -> Result<NaiveDate, String> {
    let text = text.trim();
    if let Some(format) = format {
        return NaiveDate::parse_from_str(text, format)
            .map_err(|err| format!("'{text}' does not match '{format}': {err}"));
    }
    DATE_INPUTS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| parse_datetime(text, None).ok().map(|datetime| datetime.date()))
        .ok_or_else(|| format!("'{text}' is not a date"))
}

/// Parses a datetime; a bare date is read as midnight.
pub(crate) fn parse_datetime(text: &str, format: Option<&str>) -> Result<NaiveDateTime, String> {
    let text = text.trim();
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(text, format)
            .or_else(|err| {
                NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .ok_or(err)
            })
            .map_err(|err| format!("'{text}' does not match '{format}': {err}"));
    }
    DATETIME_INPUTS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("'{text}' is not a datetime"))
}

/// Numeric ordering, exact for integers; only floats go through `f64`.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    if !a.is_f64() && !b.is_f64() {
        // A negative i64 against a u64 above i64::MAX.
        return Some(if a.is_i64() { Ordering::Less } else { Ordering::Greater });
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Equality with numbers compared by value (`2 == 2.0`).
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

/// Ordering of two non-null scalars of comparable kinds.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integer_casts_are_range_checked() {
        assert_eq!(cast_value(&json!("42"), &DataType::Int16), Ok(json!(42)));
        assert_eq!(cast_value(&json!(3.0), &DataType::Int8), Ok(json!(3)));
        assert!(cast_value(&json!(70000), &DataType::Int16).is_err());
        assert!(cast_value(&json!(-1), &DataType::UInt8).is_err());
        assert!(cast_value(&json!(1.5), &DataType::Int64).is_err());
        assert!(cast_value(&json!("abc"), &DataType::Int64).is_err());
    }

    #[test]
    fn nulls_cast_everywhere() {
        for dtype in [DataType::Int8, DataType::Date, DataType::list(DataType::String)] {
            assert_eq!(cast_value(&Value::Null, &dtype), Ok(Value::Null));
        }
    }

    #[test]
    fn temporal_casts_normalize_text() {
        assert_eq!(
            cast_value(&json!("2024/03/01"), &DataType::Date),
            Ok(json!("2024-03-01"))
        );
        assert_eq!(
            cast_value(&json!("2024-03-01T08:30:00"), &DataType::Datetime),
            Ok(json!("2024-03-01 08:30:00"))
        );
        assert!(cast_value(&json!("yesterday"), &DataType::Date).is_err());
    }

    #[test]
    fn struct_casts_follow_declared_members() {
        let dtype = DataType::Struct(vec![
            StructField::new("a", DataType::Int64),
            StructField::new("b", DataType::String),
        ]);
        assert_eq!(
            cast_value(&json!({"b": 2, "a": "1"}), &dtype),
            Ok(json!({"a": 1, "b": "2"}))
        );
    }

    #[test]
    fn integers_compare_exactly() {
        let big = 9_007_199_254_740_992_i64;
        assert!(!values_equal(&json!(big), &json!(big + 1)));
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert_eq!(
            compare_values(&json!(big + 1), &json!(big)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&json!(-1), &json!(u64::MAX)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn mixed_numbers_widen() {
        assert_eq!(infer_column(&[json!(1), json!(2.5)]), DataType::Float64);
        assert_eq!(infer_column(&[Value::Null, json!("x")]), DataType::String);
        assert_eq!(infer_column(&[]), DataType::Null);
    }
}
