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

//! # Backend Module
//!
//! The contracts Dattrs needs from a columnar engine. Dattrs never stores
//! data or evaluates expressions itself: it only builds backend-native
//! expression handles and asks the backend's frames to apply them.
//!
//! ## Contracts
//!
//! - [`Backend`]: the expression surface (column references, literals,
//!   null-fill, casts, aliases, boolean combinators) plus the category
//!   wrapper used by grouped operations (`str`, `dt`, `list`, ...)
//! - [`Frame`]: the frame surface (column names, add/replace columns,
//!   filter, emptiness, row count, projection)
//!
//! Every method is value-producing. Handles and frames are never mutated in
//! place, so a failed call leaves the caller's frame untouched.

use std::fmt::Debug;

use serde_json::Value;

use crate::dtype::DataType;
use crate::errors::Result;
use crate::namespace::Category;

/// Expression surface of a columnar engine.
pub trait Backend: Sized + Send + Sync + 'static {
    /// Opaque handle to a per-column computation. Cloning is cheap.
    type Expr: Clone + Debug + Send + Sync;

    /// Category-specific view of an expression (`expr.str`, `expr.dt`, ...).
    type Wrapper;

    /// Frame type whose columns these expressions are evaluated against.
    type Frame: Frame<Expr = Self::Expr>;

    /// Reference to an existing column.
    fn col(name: &str) -> Self::Expr;

    /// Constant column holding `value` on every row.
    fn lit(value: &Value) -> Self::Expr;

    /// Replaces nulls of `expr` with `value`; non-null values pass through.
    fn fill_null(expr: Self::Expr, value: &Value) -> Self::Expr;

    /// Casts `expr` to `dtype`. Failures surface when the frame evaluates it.
    fn cast(expr: Self::Expr, dtype: &DataType) -> Self::Expr;

    /// Renames the output of `expr`.
    fn alias(expr: Self::Expr, name: &str) -> Self::Expr;

    fn not(expr: Self::Expr) -> Self::Expr;

    fn and(left: Self::Expr, right: Self::Expr) -> Self::Expr;

    fn or(left: Self::Expr, right: Self::Expr) -> Self::Expr;

    /// Wraps `expr` into the grouped-operation view for `category`.
    fn wrap(expr: Self::Expr, category: Category) -> Self::Wrapper;
}

/// Frame surface of a columnar engine.
///
/// All operations return new frames; none mutate the receiver.
pub trait Frame: Clone + Debug + Sized + Send + Sync {
    type Expr;

    /// Current column names, in order.
    fn columns(&self) -> Vec<String>;

    /// Evaluates every expression against `self` and adds or replaces the
    /// named columns. Either all columns are produced or an error is returned.
    fn with_columns(&self, columns: Vec<(String, Self::Expr)>) -> Result<Self>;

    /// Keeps the rows for which `predicate` evaluates to true.
    fn filter(&self, predicate: &Self::Expr) -> Result<Self>;

    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    fn row_count(&self) -> usize;

    /// Projects the frame onto `names`, in that order.
    fn select(&self, names: &[String]) -> Result<Self>;

    fn has_column(&self, name: &str) -> bool {
        self.columns().iter().any(|column| column == name)
    }
}
