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

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cast::infer_column;
use super::eval::{evaluate, EvalError};
use super::expr::MemoryExpr;
use crate::backend::Frame;
use crate::dtype::DataType;
use crate::errors::{DattrsError, Result};

/// Named, typed column of JSON cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub values: Vec<Value>,
}

impl Column {
    /// Column whose type is inferred from its cells.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            dtype: infer_column(&values),
            values,
        }
    }

    pub fn typed(name: impl Into<String>, dtype: DataType, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row-aligned set of columns held in memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFrame {
    columns: Vec<Column>,
    height: usize,
}

impl MemoryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame from `(name, cells)` pairs; types are inferred.
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<Value>)>) -> Result<Self> {
        Self::from_typed_columns(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Frame from columns that carry their own types.
    pub fn from_typed_columns(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DattrsError::frame(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if column.len() != height {
                return Err(DattrsError::frame(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    height
                )));
            }
        }
        Ok(MemoryFrame { columns, height })
    }

    /// Frame from JSON objects, one per row. Columns appear in first-seen
    /// key order; keys missing from a row are null.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                DattrsError::frame(format!("record {index} is not an object: {record}"))
            })?;
            for key in object.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|record| record.get(&name).cloned().unwrap_or(Value::Null))
                    .collect();
                Column::new(name, values)
            })
            .collect();

        let mut frame = Self::from_typed_columns(columns)?;
        frame.height = records.len();
        Ok(frame)
    }

    /// Rows as JSON objects, keys in column order.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.height)
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|column| (column.name.clone(), column.values[row].clone()))
                    .collect();
                Value::Object(object)
            })
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_values(&self, name: &str) -> Option<&[Value]> {
        self.column(name).map(|column| column.values.as_slice())
    }

    pub fn dtype(&self, name: &str) -> Option<&DataType> {
        self.column(name).map(|column| &column.dtype)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    fn upsert(&mut self, column: Column) {
        match self.columns.iter_mut().find(|existing| existing.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    fn take_rows(&self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                dtype: column.dtype.clone(),
                values: column
                    .values
                    .iter()
                    .zip(keep)
                    .filter(|(_, keep)| **keep)
                    .map(|(value, _)| value.clone())
                    .collect(),
            })
            .collect();
        MemoryFrame {
            columns,
            height: keep.iter().filter(|keep| **keep).count(),
        }
    }
}

fn column_error(column: &str, err: EvalError) -> DattrsError {
    match err {
        EvalError::Cast { from, to, message } => DattrsError::cast(
            column,
            from.display_name(),
            to.display_name(),
            message,
        ),
        other => DattrsError::frame(format!("column '{column}': {other}")),
    }
}

impl Frame for MemoryFrame {
    type Expr = MemoryExpr;

    fn columns(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    fn with_columns(&self, columns: Vec<(String, MemoryExpr)>) -> Result<Self> {
        let mut evaluated = Vec::with_capacity(columns.len());
        for (name, expr) in &columns {
            let series = evaluate(expr, self).map_err(|err| column_error(name, err))?;
            evaluated.push(Column::typed(name.clone(), series.dtype, series.values));
        }

        let mut out = self.clone();
        for column in evaluated {
            out.upsert(column);
        }
        Ok(out)
    }

    fn filter(&self, predicate: &MemoryExpr) -> Result<Self> {
        let series = evaluate(predicate, self)
            .map_err(|err| DattrsError::frame(format!("filter: {err}")))?;
        let keep = series
            .values
            .iter()
            .map(|cell| match cell {
                Value::Bool(flag) => Ok(*flag),
                Value::Null => Ok(false),
                other => Err(DattrsError::frame(format!(
                    "filter predicate produced non-boolean {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.take_rows(&keep))
    }

    fn row_count(&self) -> usize {
        self.height
    }

    fn select(&self, names: &[String]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| DattrsError::frame(format!("column '{name}' not found")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MemoryFrame {
            columns,
            height: self.height,
        })
    }
}
