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

//! Built-in operations of the memory backend.
//!
//! Arguments are checked when an operation is invoked on an expression, so
//! a bad pattern or a missing parameter fails while a field is compiled,
//! before any frame is evaluated.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use super::cast::DATETIME_FORMAT;
use super::expr::{ClosedInterval, CmpOp, MemoryExpr, MemoryOp, MemoryWrapper};
use super::MemoryBackend;
use crate::errors::{DattrsError, Result};
use crate::namespace::{Arguments, Category, OperationRegistry};

type Registry = OperationRegistry<MemoryBackend>;

/// Registry holding every built-in operation.
pub(crate) fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_root(&mut registry);
    register_text(&mut registry);
    register_temporal(&mut registry);
    register_list(&mut registry);
    registry.register_in(Category::Structured, "field", struct_field);
    registry
}

fn register_root(registry: &mut Registry) {
    registry
        .register("is_null", is_null)
        .register("is_not_null", is_not_null)
        .register("is_unique", is_unique)
        .register("is_duplicated", is_duplicated)
        .register("is_in", is_in)
        .register("is_between", is_between)
        .register("eq", eq)
        .register("ne", ne)
        .register("gt", gt)
        .register("ge", ge)
        .register("lt", lt)
        .register("le", le)
        .register("abs", abs)
        .register("round", round)
        .register("clip", clip)
        .register("fill_null", fill_null);
}

fn register_text(registry: &mut Registry) {
    registry
        .register_in(Category::Text, "to_uppercase", str_to_uppercase)
        .register_in(Category::Text, "to_lowercase", str_to_lowercase)
        .register_in(Category::Text, "strip_chars", str_strip_chars)
        .register_in(Category::Text, "contains", str_contains)
        .register_in(Category::Text, "starts_with", str_starts_with)
        .register_in(Category::Text, "ends_with", str_ends_with)
        .register_in(Category::Text, "len_chars", str_len_chars)
        .register_in(Category::Text, "replace_all", str_replace_all)
        .register_in(Category::Text, "slice", str_slice)
        .register_in(Category::Text, "to_date", str_to_date)
        .register_in(Category::Text, "to_datetime", str_to_datetime);
}

fn register_temporal(registry: &mut Registry) {
    registry
        .register_in(Category::Temporal, "year", dt_year)
        .register_in(Category::Temporal, "month", dt_month)
        .register_in(Category::Temporal, "day", dt_day)
        .register_in(Category::Temporal, "hour", dt_hour)
        .register_in(Category::Temporal, "minute", dt_minute)
        .register_in(Category::Temporal, "second", dt_second)
        .register_in(Category::Temporal, "to_string", dt_to_string);
}

fn register_list(registry: &mut Registry) {
    registry
        .register_in(Category::List, "len", list_len)
        .register_in(Category::List, "join", list_join)
        .register_in(Category::List, "contains", list_contains)
        .register_in(Category::List, "get", list_get);
}

// Argument helpers

fn no_arguments(operation: &str, args: &Arguments) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(DattrsError::invalid_arguments(
            operation,
            "operation takes no arguments",
        ))
    }
}

fn string_arg(operation: &str, args: &Arguments, position: usize, key: &str) -> Result<String> {
    match args.require(operation, position, key)? {
        Value::String(text) => Ok(text.clone()),
        other => Err(DattrsError::invalid_arguments(
            operation,
            format!("'{key}' must be a string, got {other}"),
        )),
    }
}

fn optional_string(
    operation: &str,
    args: &Arguments,
    position: usize,
    key: &str,
) -> Result<Option<String>> {
    match args.get(position, key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(DattrsError::invalid_arguments(
            operation,
            format!("'{key}' must be a string, got {other}"),
        )),
    }
}

fn flag_arg(operation: &str, args: &Arguments, position: usize, key: &str) -> Result<bool> {
    match args.get(position, key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(DattrsError::invalid_arguments(
            operation,
            format!("'{key}' must be a boolean, got {other}"),
        )),
    }
}

fn int_arg(operation: &str, args: &Arguments, position: usize, key: &str) -> Result<i64> {
    let value = args.require(operation, position, key)?;
    value.as_i64().ok_or_else(|| {
        DattrsError::invalid_arguments(operation, format!("'{key}' must be an integer, got {value}"))
    })
}

fn optional_int(
    operation: &str,
    args: &Arguments,
    position: usize,
    key: &str,
) -> Result<Option<i64>> {
    match args.get(position, key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            DattrsError::invalid_arguments(
                operation,
                format!("'{key}' must be an integer, got {value}"),
            )
        }),
    }
}

fn value_arg(operation: &str, args: &Arguments, position: usize, key: &str) -> Result<Value> {
    args.require(operation, position, key).cloned()
}

fn pattern_arg(operation: &str, args: &Arguments) -> Result<Regex> {
    let pattern = string_arg(operation, args, 0, "pattern")?;
    let literal_position = if operation == "str.replace_all" { 2 } else { 1 };
    let source = if flag_arg(operation, args, literal_position, "literal")? {
        regex::escape(&pattern)
    } else {
        pattern
    };
    Regex::new(&source)
        .map_err(|err| DattrsError::invalid_arguments(operation, format!("bad pattern: {err}")))
}

fn strftime_arg(operation: &str, args: &Arguments) -> Result<String> {
    let format =
        optional_string(operation, args, 0, "format")?.unwrap_or_else(|| DATETIME_FORMAT.into());
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(DattrsError::invalid_arguments(
            operation,
            format!("bad format string '{format}'"),
        ));
    }
    Ok(format)
}

// Root operations

fn is_null(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("is_null", args)?;
    Ok(expr.is_null())
}

fn is_not_null(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("is_not_null", args)?;
    Ok(expr.is_not_null())
}

fn is_unique(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("is_unique", args)?;
    Ok(expr.apply(MemoryOp::IsUnique))
}

fn is_duplicated(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("is_duplicated", args)?;
    Ok(expr.apply(MemoryOp::IsDuplicated))
}

fn is_in(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    match value_arg("is_in", args, 0, "other")? {
        Value::Array(candidates) => Ok(expr.apply(MemoryOp::IsIn(candidates))),
        other => Err(DattrsError::invalid_arguments(
            "is_in",
            format!("'other' must be a list, got {other}"),
        )),
    }
}

fn is_between(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    let lower = value_arg("is_between", args, 0, "lower_bound")?;
    let upper = value_arg("is_between", args, 1, "upper_bound")?;
    let closed = match optional_string("is_between", args, 2, "closed")?.as_deref() {
        None | Some("both") => ClosedInterval::Both,
        Some("left") => ClosedInterval::Left,
        Some("right") => ClosedInterval::Right,
        Some("none") => ClosedInterval::None,
        Some(other) => {
            return Err(DattrsError::invalid_arguments(
                "is_between",
                format!("'closed' must be one of both/left/right/none, got '{other}'"),
            ))
        }
    };
    Ok(expr.apply(MemoryOp::IsBetween {
        lower,
        upper,
        closed,
    }))
}

fn compare(cmp: CmpOp, expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    let other = value_arg(cmp.as_str(), args, 0, "other")?;
    Ok(expr.apply(MemoryOp::Compare(cmp, other)))
}

fn eq(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Eq, expr, args)
}

fn ne(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Ne, expr, args)
}

fn gt(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Gt, expr, args)
}

fn ge(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Ge, expr, args)
}

fn lt(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Lt, expr, args)
}

fn le(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    compare(CmpOp::Le, expr, args)
}

fn abs(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("abs", args)?;
    Ok(expr.apply(MemoryOp::Abs))
}

fn round(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    let decimals = optional_int("round", args, 0, "decimals")?.unwrap_or(0);
    let decimals = i32::try_from(decimals)
        .ok()
        .and_then(|decimals| u32::try_from(decimals).ok())
        .ok_or_else(|| {
            DattrsError::invalid_arguments(
                "round",
                format!("'decimals' must be between 0 and {}, got {decimals}", i32::MAX),
            )
        })?;
    Ok(expr.apply(MemoryOp::Round(decimals)))
}

fn clip(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    let lower = args.get(0, "lower_bound").cloned();
    let upper = args.get(1, "upper_bound").cloned();
    if lower.is_none() && upper.is_none() {
        return Err(DattrsError::invalid_arguments(
            "clip",
            "at least one of 'lower_bound' or 'upper_bound' is required",
        ));
    }
    Ok(expr.apply(MemoryOp::Clip { lower, upper }))
}

fn fill_null(expr: MemoryExpr, args: &Arguments) -> Result<MemoryExpr> {
    Ok(expr.fill_null(value_arg("fill_null", args, 0, "value")?))
}

// str

fn str_to_uppercase(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("str.to_uppercase", args)?;
    Ok(wrapper.apply(MemoryOp::ToUppercase))
}

fn str_to_lowercase(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("str.to_lowercase", args)?;
    Ok(wrapper.apply(MemoryOp::ToLowercase))
}

fn str_strip_chars(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let characters = optional_string("str.strip_chars", args, 0, "characters")?;
    Ok(wrapper.apply(MemoryOp::StripChars(characters)))
}

fn str_contains(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let pattern = pattern_arg("str.contains", args)?;
    Ok(wrapper.apply(MemoryOp::Contains(pattern)))
}

fn str_starts_with(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let prefix = string_arg("str.starts_with", args, 0, "prefix")?;
    Ok(wrapper.apply(MemoryOp::StartsWith(prefix)))
}

fn str_ends_with(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let suffix = string_arg("str.ends_with", args, 0, "suffix")?;
    Ok(wrapper.apply(MemoryOp::EndsWith(suffix)))
}

fn str_len_chars(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("str.len_chars", args)?;
    Ok(wrapper.apply(MemoryOp::LenChars))
}

fn str_replace_all(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let pattern = pattern_arg("str.replace_all", args)?;
    let value = string_arg("str.replace_all", args, 1, "value")?;
    Ok(wrapper.apply(MemoryOp::ReplaceAll { pattern, value }))
}

fn str_slice(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let offset = int_arg("str.slice", args, 0, "offset")?;
    let length = optional_int("str.slice", args, 1, "length")?
        .map(|length| {
            usize::try_from(length).map_err(|_| {
                DattrsError::invalid_arguments(
                    "str.slice",
                    format!("'length' must be >= 0, got {length}"),
                )
            })
        })
        .transpose()?;
    Ok(wrapper.apply(MemoryOp::Slice { offset, length }))
}

fn str_to_date(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let format = optional_string("str.to_date", args, 0, "format")?;
    Ok(wrapper.apply(MemoryOp::ToDate(format)))
}

fn str_to_datetime(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let format = optional_string("str.to_datetime", args, 0, "format")?;
    Ok(wrapper.apply(MemoryOp::ToDatetime(format)))
}

// dt

fn dt_year(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.year", args)?;
    Ok(wrapper.apply(MemoryOp::Year))
}

fn dt_month(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.month", args)?;
    Ok(wrapper.apply(MemoryOp::Month))
}

fn dt_day(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.day", args)?;
    Ok(wrapper.apply(MemoryOp::Day))
}

fn dt_hour(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.hour", args)?;
    Ok(wrapper.apply(MemoryOp::Hour))
}

fn dt_minute(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.minute", args)?;
    Ok(wrapper.apply(MemoryOp::Minute))
}

fn dt_second(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("dt.second", args)?;
    Ok(wrapper.apply(MemoryOp::Second))
}

fn dt_to_string(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let format = strftime_arg("dt.to_string", args)?;
    // Timezone items (`%z`, `%Z`, ...) cannot render a naive datetime.
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DattrsError::internal("sample datetime out of range"))?;
    let mut rendered = String::new();
    if write!(rendered, "{}", sample.format(&format)).is_err() {
        return Err(DattrsError::invalid_arguments(
            "dt.to_string",
            format!("format '{format}' needs a timezone, which stored datetimes do not carry"),
        ));
    }
    Ok(wrapper.apply(MemoryOp::Strftime(format)))
}

// list

fn list_len(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    no_arguments("list.len", args)?;
    Ok(wrapper.apply(MemoryOp::ListLen))
}

fn list_join(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let separator = string_arg("list.join", args, 0, "separator")?;
    Ok(wrapper.apply(MemoryOp::ListJoin(separator)))
}

fn list_contains(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let item = value_arg("list.contains", args, 0, "item")?;
    Ok(wrapper.apply(MemoryOp::ListContains(item)))
}

fn list_get(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let index = int_arg("list.get", args, 0, "index")?;
    Ok(wrapper.apply(MemoryOp::ListGet(index)))
}

// struct

fn struct_field(wrapper: MemoryWrapper, args: &Arguments) -> Result<MemoryExpr> {
    let name = string_arg("struct.field", args, 0, "name")?;
    Ok(wrapper.apply(MemoryOp::StructField(name)))
}
