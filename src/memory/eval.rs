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

//! Column-at-a-time evaluation of [`MemoryExpr`] trees.
//!
//! Element-wise operations propagate nulls: a null cell produces a null cell
//! without invoking the operation. Boolean combinators follow three-valued
//! logic (`false AND null` is false, `true OR null` is true).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write;

use serde_json::{Number, Value};
use thiserror::Error;

use super::cast::{
    cast_value, compare_values, infer_value, parse_date, parse_datetime, values_equal, DATE_FORMAT,
    DATETIME_FORMAT,
};
use super::expr::{ClosedInterval, CmpOp, MemoryExpr, MemoryOp};
use super::frame::MemoryFrame;
use crate::dtype::DataType;

/// Evaluated column.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Series {
    pub dtype: DataType,
    pub values: Vec<Value>,
}

impl Series {
    fn booleans(values: Vec<Value>) -> Self {
        Series {
            dtype: DataType::Boolean,
            values,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum EvalError {
    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("cannot cast {from} to {to}: {message}")]
    Cast {
        from: DataType,
        to: DataType,
        message: String,
    },

    #[error("{operation}: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

type EvalResult<T> = Result<T, EvalError>;

pub(crate) fn evaluate(expr: &MemoryExpr, frame: &MemoryFrame) -> EvalResult<Series> {
    match expr {
        MemoryExpr::Column(name) => frame
            .column(name)
            .map(|column| Series {
                dtype: column.dtype.clone(),
                values: column.values.clone(),
            })
            .ok_or_else(|| EvalError::MissingColumn(name.clone())),
        MemoryExpr::Literal(value) => Ok(Series {
            dtype: infer_value(value),
            values: vec![value.clone(); frame.height()],
        }),
        MemoryExpr::FillNull { expr, value } => {
            let input = evaluate(expr, frame)?;
            let dtype = match input.dtype {
                DataType::Null => infer_value(value),
                dtype => dtype,
            };
            let values = input
                .values
                .into_iter()
                .map(|cell| if cell.is_null() { value.clone() } else { cell })
                .collect();
            Ok(Series { dtype, values })
        }
        MemoryExpr::Cast { expr, dtype } => {
            let input = evaluate(expr, frame)?;
            let values = input
                .values
                .iter()
                .map(|cell| cast_value(cell, dtype))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|message| EvalError::Cast {
                    from: input.dtype.clone(),
                    to: dtype.clone(),
                    message,
                })?;
            Ok(Series {
                dtype: dtype.clone(),
                values,
            })
        }
        MemoryExpr::Alias { expr, .. } => evaluate(expr, frame),
        MemoryExpr::Not(expr) => {
            let input = evaluate(expr, frame)?;
            let values = input
                .values
                .iter()
                .map(|cell| Ok(truth(cell, "not")?.map_or(Value::Null, |flag| Value::Bool(!flag))))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Series::booleans(values))
        }
        MemoryExpr::And(left, right) => combine(left, right, frame, "and", kleene_and),
        MemoryExpr::Or(left, right) => combine(left, right, frame, "or", kleene_or),
        MemoryExpr::Apply { expr, op } => apply_op(op, evaluate(expr, frame)?),
    }
}

fn truth(cell: &Value, operation: &'static str) -> EvalResult<Option<bool>> {
    match cell {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(*flag)),
        other => Err(EvalError::Operation {
            operation,
            message: format!("expected a boolean, found {other}"),
        }),
    }
}

fn kleene_and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn kleene_or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn combine(
    left: &MemoryExpr,
    right: &MemoryExpr,
    frame: &MemoryFrame,
    operation: &'static str,
    logic: fn(Option<bool>, Option<bool>) -> Option<bool>,
) -> EvalResult<Series> {
    let left = evaluate(left, frame)?;
    let right = evaluate(right, frame)?;
    let values = left
        .values
        .iter()
        .zip(&right.values)
        .map(|(a, b)| {
            let flag = logic(truth(a, operation)?, truth(b, operation)?);
            Ok(flag.map_or(Value::Null, Value::Bool))
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Series::booleans(values))
}

/// Applies `f` to every non-null cell.
fn map_cells<F>(input: &Series, dtype: DataType, operation: &'static str, f: F) -> EvalResult<Series>
where
    F: Fn(&Value) -> Result<Value, String>,
{
    let values = input
        .values
        .iter()
        .map(|cell| if cell.is_null() { Ok(Value::Null) } else { f(cell) })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| EvalError::Operation { operation, message })?;
    Ok(Series { dtype, values })
}

/// Applies `f` to every non-null string cell; other cells are an error.
fn map_str<F>(input: &Series, dtype: DataType, operation: &'static str, f: F) -> EvalResult<Series>
where
    F: Fn(&str) -> Result<Value, String>,
{
    map_cells(input, dtype, operation, |cell| match cell {
        Value::String(text) => f(text),
        other => Err(format!("expected a string, found {other}")),
    })
}

fn map_list<F>(input: &Series, dtype: DataType, operation: &'static str, f: F) -> EvalResult<Series>
where
    F: Fn(&[Value]) -> Result<Value, String>,
{
    map_cells(input, dtype, operation, |cell| match cell {
        Value::Array(items) => f(items),
        other => Err(format!("expected a list, found {other}")),
    })
}

fn ordering(cell: &Value, bound: &Value) -> Result<Ordering, String> {
    compare_values(cell, bound).ok_or_else(|| format!("cannot compare {cell} with {bound}"))
}

/// Hashable identity of a cell; numbers compare by value.
///
/// Integers are keyed exactly. Floats with no fractional part share the
/// integer key so that `2` and `2.0` collide.
fn cell_key(cell: &Value) -> String {
    match cell {
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(integer), _, _) => format!("i:{integer}"),
            (None, Some(integer), _) => format!("i:{integer}"),
            (None, None, Some(float)) if float.fract() == 0.0 && float.abs() < 9.0e18 => {
                format!("i:{}", float as i64)
            }
            (None, None, Some(float)) => format!("f:{float}"),
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

fn count(n: usize) -> Value {
    Value::Number(Number::from(n as u64))
}

fn apply_op(op: &MemoryOp, input: Series) -> EvalResult<Series> {
    let name = op_name(op);
    match op {
        MemoryOp::IsNull => Ok(Series::booleans(
            input.values.iter().map(|cell| Value::Bool(cell.is_null())).collect(),
        )),
        MemoryOp::IsNotNull => Ok(Series::booleans(
            input.values.iter().map(|cell| Value::Bool(!cell.is_null())).collect(),
        )),
        MemoryOp::IsUnique | MemoryOp::IsDuplicated => {
            let keys: Vec<String> = input.values.iter().map(cell_key).collect();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for key in &keys {
                *counts.entry(key.as_str()).or_default() += 1;
            }
            let want_unique = matches!(op, MemoryOp::IsUnique);
            Ok(Series::booleans(
                keys.iter()
                    .map(|key| {
                        let unique = counts.get(key.as_str()).copied().unwrap_or(0) == 1;
                        Value::Bool(unique == want_unique)
                    })
                    .collect(),
            ))
        }
        MemoryOp::IsIn(candidates) => map_cells(&input, DataType::Boolean, name, |cell| {
            Ok(Value::Bool(
                candidates.iter().any(|candidate| values_equal(cell, candidate)),
            ))
        }),
        MemoryOp::IsBetween {
            lower,
            upper,
            closed,
        } => map_cells(&input, DataType::Boolean, name, |cell| {
            let low = ordering(cell, lower)?;
            let high = ordering(cell, upper)?;
            let above = match closed {
                ClosedInterval::Both | ClosedInterval::Left => low != Ordering::Less,
                ClosedInterval::Right | ClosedInterval::None => low == Ordering::Greater,
            };
            let below = match closed {
                ClosedInterval::Both | ClosedInterval::Right => high != Ordering::Greater,
                ClosedInterval::Left | ClosedInterval::None => high == Ordering::Less,
            };
            Ok(Value::Bool(above && below))
        }),
        MemoryOp::Compare(cmp, rhs) => map_cells(&input, DataType::Boolean, name, |cell| {
            if rhs.is_null() {
                return Ok(Value::Null);
            }
            let flag = match cmp {
                CmpOp::Eq => values_equal(cell, rhs),
                CmpOp::Ne => !values_equal(cell, rhs),
                CmpOp::Gt => ordering(cell, rhs)? == Ordering::Greater,
                CmpOp::Ge => ordering(cell, rhs)? != Ordering::Less,
                CmpOp::Lt => ordering(cell, rhs)? == Ordering::Less,
                CmpOp::Le => ordering(cell, rhs)? != Ordering::Greater,
            };
            Ok(Value::Bool(flag))
        }),
        MemoryOp::Abs => map_cells(&input, input.dtype.clone(), name, |cell| match cell {
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    integer
                        .checked_abs()
                        .map(|abs| Value::Number(Number::from(abs)))
                        .ok_or_else(|| format!("{integer} overflows"))
                } else if number.is_u64() {
                    Ok(cell.clone())
                } else {
                    super::cast::float_value(number.as_f64().unwrap_or(f64::NAN).abs())
                }
            }
            other => Err(format!("expected a number, found {other}")),
        }),
        MemoryOp::Round(decimals) => map_cells(&input, input.dtype.clone(), name, |cell| match cell {
            Value::Number(number) if number.is_f64() => {
                let exponent = i32::try_from(*decimals)
                    .map_err(|_| format!("{decimals} decimals is out of range"))?;
                let factor = 10f64.powi(exponent);
                let float = number.as_f64().unwrap_or(f64::NAN);
                super::cast::float_value((float * factor).round() / factor)
            }
            Value::Number(_) => Ok(cell.clone()),
            other => Err(format!("expected a number, found {other}")),
        }),
        MemoryOp::Clip { lower, upper } => map_cells(&input, input.dtype.clone(), name, |cell| {
            if !cell.is_number() {
                return Err(format!("expected a number, found {cell}"));
            }
            if let Some(lower) = lower.as_ref().filter(|bound| !bound.is_null()) {
                if ordering(cell, lower)? == Ordering::Less {
                    return Ok(lower.clone());
                }
            }
            if let Some(upper) = upper.as_ref().filter(|bound| !bound.is_null()) {
                if ordering(cell, upper)? == Ordering::Greater {
                    return Ok(upper.clone());
                }
            }
            Ok(cell.clone())
        }),

        MemoryOp::ToUppercase => map_str(&input, DataType::String, name, |text| {
            Ok(Value::String(text.to_uppercase()))
        }),
        MemoryOp::ToLowercase => map_str(&input, DataType::String, name, |text| {
            Ok(Value::String(text.to_lowercase()))
        }),
        MemoryOp::StripChars(chars) => map_str(&input, DataType::String, name, |text| {
            let stripped = match chars {
                Some(chars) => text.trim_matches(|c: char| chars.contains(c)),
                None => text.trim(),
            };
            Ok(Value::String(stripped.to_string()))
        }),
        MemoryOp::Contains(pattern) => map_str(&input, DataType::Boolean, name, |text| {
            Ok(Value::Bool(pattern.is_match(text)))
        }),
        MemoryOp::StartsWith(prefix) => map_str(&input, DataType::Boolean, name, |text| {
            Ok(Value::Bool(text.starts_with(prefix.as_str())))
        }),
        MemoryOp::EndsWith(suffix) => map_str(&input, DataType::Boolean, name, |text| {
            Ok(Value::Bool(text.ends_with(suffix.as_str())))
        }),
        MemoryOp::LenChars => map_str(&input, DataType::UInt32, name, |text| {
            Ok(count(text.chars().count()))
        }),
        MemoryOp::ReplaceAll { pattern, value } => map_str(&input, DataType::String, name, |text| {
            Ok(Value::String(
                pattern.replace_all(text, value.as_str()).into_owned(),
            ))
        }),
        MemoryOp::Slice { offset, length } => map_str(&input, DataType::String, name, |text| {
            let chars: Vec<char> = text.chars().collect();
            let start = if *offset < 0 {
                chars.len().saturating_sub(offset.unsigned_abs() as usize)
            } else {
                (*offset as usize).min(chars.len())
            };
            let end = match length {
                Some(length) => start.saturating_add(*length).min(chars.len()),
                None => chars.len(),
            };
            Ok(Value::String(chars[start..end].iter().collect()))
        }),
        MemoryOp::ConcatStr(suffix) => map_str(&input, DataType::String, name, |text| {
            Ok(Value::String(format!("{text}{suffix}")))
        }),
        MemoryOp::ToDate(format) => map_str(&input, DataType::Date, name, |text| {
            let date = parse_date(text, format.as_deref())?;
            Ok(Value::String(date.format(DATE_FORMAT).to_string()))
        }),
        MemoryOp::ToDatetime(format) => map_str(&input, DataType::Datetime, name, |text| {
            let datetime = parse_datetime(text, format.as_deref())?;
            Ok(Value::String(datetime.format(DATETIME_FORMAT).to_string()))
        }),

        MemoryOp::Year
        | MemoryOp::Month
        | MemoryOp::Day
        | MemoryOp::Hour
        | MemoryOp::Minute
        | MemoryOp::Second => map_str(&input, DataType::Int32, name, |text| {
            use chrono::{Datelike, Timelike};
            let datetime = parse_datetime(text, None)?;
            let part = match op {
                MemoryOp::Year => i64::from(datetime.year()),
                MemoryOp::Month => i64::from(datetime.month()),
                MemoryOp::Day => i64::from(datetime.day()),
                MemoryOp::Hour => i64::from(datetime.hour()),
                MemoryOp::Minute => i64::from(datetime.minute()),
                _ => i64::from(datetime.second()),
            };
            Ok(Value::Number(Number::from(part)))
        }),
        MemoryOp::Strftime(format) => map_str(&input, DataType::String, name, |text| {
            let datetime = parse_datetime(text, None)?;
            let mut rendered = String::new();
            write!(rendered, "{}", datetime.format(format))
                .map_err(|_| format!("format '{format}' cannot render a datetime without a timezone"))?;
            Ok(Value::String(rendered))
        }),

        MemoryOp::ListLen => map_list(&input, DataType::UInt32, name, |items| Ok(count(items.len()))),
        MemoryOp::ListJoin(separator) => map_list(&input, DataType::String, name, |items| {
            let parts = items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::String(text) => Ok(text.clone()),
                    Value::Number(number) => Ok(number.to_string()),
                    Value::Bool(flag) => Ok(flag.to_string()),
                    other => Err(format!("cannot join nested value {other}")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::String(parts.join(separator)))
        }),
        MemoryOp::ListContains(item) => map_list(&input, DataType::Boolean, name, |items| {
            Ok(Value::Bool(items.iter().any(|candidate| values_equal(candidate, item))))
        }),
        MemoryOp::ListGet(index) => {
            let dtype = match &input.dtype {
                DataType::List(inner) => (**inner).clone(),
                _ => DataType::Null,
            };
            map_list(&input, dtype, name, |items| {
                let position = if *index < 0 {
                    items.len().checked_sub(index.unsigned_abs() as usize)
                } else {
                    Some(*index as usize)
                };
                Ok(position
                    .and_then(|position| items.get(position))
                    .cloned()
                    .unwrap_or(Value::Null))
            })
        }

        MemoryOp::StructField(member) => {
            let dtype = match &input.dtype {
                DataType::Struct(fields) => fields
                    .iter()
                    .find(|field| &field.name == member)
                    .map(|field| field.dtype.clone())
                    .unwrap_or(DataType::Null),
                _ => DataType::Null,
            };
            map_cells(&input, dtype, name, |cell| match cell {
                Value::Object(members) => Ok(members.get(member).cloned().unwrap_or(Value::Null)),
                other => Err(format!("expected a struct, found {other}")),
            })
        }
    }
}

fn op_name(op: &MemoryOp) -> &'static str {
    match op {
        MemoryOp::IsNull => "is_null",
        MemoryOp::IsNotNull => "is_not_null",
        MemoryOp::IsUnique => "is_unique",
        MemoryOp::IsDuplicated => "is_duplicated",
        MemoryOp::IsIn(_) => "is_in",
        MemoryOp::IsBetween { .. } => "is_between",
        MemoryOp::Compare(cmp, _) => cmp.as_str(),
        MemoryOp::Abs => "abs",
        MemoryOp::Round(_) => "round",
        MemoryOp::Clip { .. } => "clip",
        MemoryOp::ToUppercase => "str.to_uppercase",
        MemoryOp::ToLowercase => "str.to_lowercase",
        MemoryOp::StripChars(_) => "str.strip_chars",
        MemoryOp::Contains(_) => "str.contains",
        MemoryOp::StartsWith(_) => "str.starts_with",
        MemoryOp::EndsWith(_) => "str.ends_with",
        MemoryOp::LenChars => "str.len_chars",
        MemoryOp::ReplaceAll { .. } => "str.replace_all",
        MemoryOp::Slice { .. } => "str.slice",
        MemoryOp::ConcatStr(_) => "str.concat",
        MemoryOp::ToDate(_) => "str.to_date",
        MemoryOp::ToDatetime(_) => "str.to_datetime",
        MemoryOp::Year => "dt.year",
        MemoryOp::Month => "dt.month",
        MemoryOp::Day => "dt.day",
        MemoryOp::Hour => "dt.hour",
        MemoryOp::Minute => "dt.minute",
        MemoryOp::Second => "dt.second",
        MemoryOp::Strftime(_) => "dt.to_string",
        MemoryOp::ListLen => "list.len",
        MemoryOp::ListJoin(_) => "list.join",
        MemoryOp::ListContains(_) => "list.contains",
        MemoryOp::ListGet(_) => "list.get",
        MemoryOp::StructField(_) => "struct.field",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn frame(values: Vec<Value>) -> MemoryFrame {
        MemoryFrame::from_columns(vec![("a", values)]).unwrap()
    }

    fn eval(expr: MemoryExpr, values: Vec<Value>) -> Vec<Value> {
        evaluate(&expr, &frame(values)).unwrap().values
    }

    #[test]
    fn three_valued_logic() {
        let values = vec![json!(true), json!(false), Value::Null];
        let a = || MemoryExpr::column("a");

        assert_eq!(
            eval(a().and(MemoryExpr::literal(false)), values.clone()),
            vec![json!(false), json!(false), json!(false)]
        );
        assert_eq!(
            eval(a().or(MemoryExpr::literal(true)), values.clone()),
            vec![json!(true), json!(true), json!(true)]
        );
        assert_eq!(
            eval(a().not(), values),
            vec![json!(false), json!(true), Value::Null]
        );
    }

    #[test]
    fn duplicates_count_every_occurrence() {
        let out = eval(
            MemoryExpr::column("a").apply(MemoryOp::IsDuplicated),
            vec![json!(0), json!(1), json!(2), json!(2.0)],
        );
        assert_eq!(out, vec![json!(false), json!(false), json!(true), json!(true)]);
    }

    #[test]
    fn large_integers_keep_their_identity() {
        let big = 9_007_199_254_740_992_i64;
        let out = eval(
            MemoryExpr::column("a").apply(MemoryOp::IsUnique),
            vec![json!(big), json!(big + 1)],
        );
        assert_eq!(out, vec![json!(true), json!(true)]);

        let out = eval(
            MemoryExpr::column("a").apply(MemoryOp::IsIn(vec![json!(big + 1)])),
            vec![json!(big), json!(big + 1)],
        );
        assert_eq!(out, vec![json!(false), json!(true)]);
    }

    #[test]
    fn timezone_formats_are_errors_not_panics() {
        let err = evaluate(
            &MemoryExpr::column("a").apply(MemoryOp::Strftime("%Y %z".to_string())),
            &frame(vec![json!("2024-03-01 08:00:00")]),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Operation { .. }));
    }

    #[test]
    fn oversized_rounding_is_an_error() {
        let err = evaluate(
            &MemoryExpr::column("a").apply(MemoryOp::Round(u32::MAX)),
            &frame(vec![json!(1.25)]),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Operation { .. }));
    }

    #[test]
    fn comparisons_propagate_nulls() {
        let out = eval(MemoryExpr::column("a").ge(0), vec![json!(-1), json!(3), Value::Null]);
        assert_eq!(out, vec![json!(false), json!(true), Value::Null]);
    }

    #[test]
    fn string_operations_reject_non_strings() {
        let err = evaluate(
            &MemoryExpr::column("a").apply(MemoryOp::ToUppercase),
            &frame(vec![json!(1)]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("str.to_uppercase"));
    }

    #[test]
    fn slice_counts_from_the_end() {
        let out = eval(
            MemoryExpr::column("a").apply(MemoryOp::Slice {
                offset: -3,
                length: None,
            }),
            vec![json!("2024-03-01"), json!("ab")],
        );
        assert_eq!(out, vec![json!("-01"), json!("ab")]);
    }

    #[test]
    fn cast_failures_keep_both_types() {
        let err = evaluate(
            &MemoryExpr::column("a").cast(DataType::Int16),
            &frame(vec![json!("12"), json!("x")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EvalError::Cast {
                from: DataType::String,
                to: DataType::Int16,
                ..
            }
        ));
    }
}
