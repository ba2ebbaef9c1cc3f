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

//! # Memory Backend
//!
//! Reference [`Backend`] over JSON cells held in memory.
//!
//! Expressions are plain trees ([`MemoryExpr`]) evaluated column-at-a-time
//! by [`MemoryFrame`]. Casts are strict, temporal values are normalized
//! text (`%Y-%m-%d`, `%Y-%m-%d %H:%M:%S`), and every element-wise operation
//! propagates nulls.
//!
//! ## Operations
//!
//! | Namespace | Operations |
//! |-----------|------------|
//! | root | `is_null`, `is_not_null`, `is_unique`, `is_duplicated`, `is_in`, `is_between`, `eq`, `ne`, `gt`, `ge`, `lt`, `le`, `abs`, `round`, `clip`, `fill_null` |
//! | `str` | `to_uppercase`, `to_lowercase`, `strip_chars`, `contains`, `starts_with`, `ends_with`, `len_chars`, `replace_all`, `slice`, `to_date`, `to_datetime` |
//! | `dt` | `year`, `month`, `day`, `hour`, `minute`, `second`, `to_string` |
//! | `list` | `len`, `join`, `contains`, `get` |
//! | `struct` | `field` |
//!
//! Additional operations can be registered on [`MemoryBackend::registry`]
//! before it is turned into a namespace.

mod cast;
mod eval;
mod expr;
mod frame;
mod ops;

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::backend::Backend;
use crate::dtype::DataType;
use crate::namespace::{Category, OperationNamespace, OperationRegistry};

pub use expr::{ClosedInterval, CmpOp, MemoryExpr, MemoryOp, MemoryWrapper};
pub use frame::{Column, MemoryFrame};

static BUILTINS: OnceLock<Arc<OperationRegistry<MemoryBackend>>> = OnceLock::new();

/// In-memory reference backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryBackend;

impl MemoryBackend {
    /// Fresh registry with every built-in operation, open for extension.
    pub fn registry() -> OperationRegistry<Self> {
        ops::builtin_registry()
    }

    /// Namespace over the shared built-in registry.
    pub fn namespace() -> OperationNamespace<Self> {
        let registry = BUILTINS.get_or_init(|| {
            log::debug!("building memory backend operation registry");
            Arc::new(ops::builtin_registry())
        });
        OperationNamespace::new(Arc::clone(registry))
    }
}

impl Backend for MemoryBackend {
    type Expr = MemoryExpr;
    type Wrapper = MemoryWrapper;
    type Frame = MemoryFrame;

    fn col(name: &str) -> MemoryExpr {
        MemoryExpr::column(name)
    }

    fn lit(value: &Value) -> MemoryExpr {
        MemoryExpr::Literal(value.clone())
    }

    fn fill_null(expr: MemoryExpr, value: &Value) -> MemoryExpr {
        expr.fill_null(value.clone())
    }

    fn cast(expr: MemoryExpr, dtype: &DataType) -> MemoryExpr {
        expr.cast(dtype.clone())
    }

    fn alias(expr: MemoryExpr, name: &str) -> MemoryExpr {
        expr.alias(name)
    }

    fn not(expr: MemoryExpr) -> MemoryExpr {
        expr.not()
    }

    fn and(left: MemoryExpr, right: MemoryExpr) -> MemoryExpr {
        left.and(right)
    }

    fn or(left: MemoryExpr, right: MemoryExpr) -> MemoryExpr {
        left.or(right)
    }

    fn wrap(expr: MemoryExpr, category: Category) -> MemoryWrapper {
        MemoryWrapper { category, expr }
    }
}
