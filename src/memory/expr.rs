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

use regex::Regex;
use serde_json::Value;

use crate::dtype::DataType;
use crate::namespace::Category;

/// Comparison against a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Gt => "gt",
            CmpOp::Ge => "ge",
            CmpOp::Lt => "lt",
            CmpOp::Le => "le",
        }
    }
}

/// Which ends of an `is_between` interval are inclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClosedInterval {
    #[default]
    Both,
    Left,
    Right,
    None,
}

/// Element-wise or column-wise operation applied to an evaluated column.
#[derive(Clone, Debug)]
pub enum MemoryOp {
    IsNull,
    IsNotNull,
    /// True for rows whose value occurs exactly once in the column.
    IsUnique,
    IsDuplicated,
    IsIn(Vec<Value>),
    IsBetween {
        lower: Value,
        upper: Value,
        closed: ClosedInterval,
    },
    Compare(CmpOp, Value),
    Abs,
    Round(u32),
    Clip {
        lower: Option<Value>,
        upper: Option<Value>,
    },

    ToUppercase,
    ToLowercase,
    StripChars(Option<String>),
    Contains(Regex),
    StartsWith(String),
    EndsWith(String),
    LenChars,
    ReplaceAll {
        pattern: Regex,
        value: String,
    },
    Slice {
        offset: i64,
        length: Option<usize>,
    },
    ConcatStr(String),
    ToDate(Option<String>),
    ToDatetime(Option<String>),

    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Strftime(String),

    ListLen,
    ListJoin(String),
    ListContains(Value),
    ListGet(i64),

    StructField(String),
}

/// Expression tree evaluated column-at-a-time by [`MemoryFrame`](super::MemoryFrame).
#[derive(Clone, Debug)]
pub enum MemoryExpr {
    Column(String),
    Literal(Value),
    FillNull {
        expr: Box<MemoryExpr>,
        value: Value,
    },
    Cast {
        expr: Box<MemoryExpr>,
        dtype: DataType,
    },
    Alias {
        expr: Box<MemoryExpr>,
        name: String,
    },
    Not(Box<MemoryExpr>),
    And(Box<MemoryExpr>, Box<MemoryExpr>),
    Or(Box<MemoryExpr>, Box<MemoryExpr>),
    Apply {
        expr: Box<MemoryExpr>,
        op: MemoryOp,
    },
}

impl MemoryExpr {
    pub fn column(name: impl Into<String>) -> Self {
        MemoryExpr::Column(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        MemoryExpr::Literal(value.into())
    }

    pub fn apply(self, op: MemoryOp) -> Self {
        MemoryExpr::Apply {
            expr: Box::new(self),
            op,
        }
    }

    pub fn fill_null(self, value: impl Into<Value>) -> Self {
        MemoryExpr::FillNull {
            expr: Box::new(self),
            value: value.into(),
        }
    }

    pub fn cast(self, dtype: DataType) -> Self {
        MemoryExpr::Cast {
            expr: Box::new(self),
            dtype,
        }
    }

    pub fn alias(self, name: impl Into<String>) -> Self {
        MemoryExpr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        MemoryExpr::Not(Box::new(self))
    }

    pub fn and(self, other: MemoryExpr) -> Self {
        MemoryExpr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: MemoryExpr) -> Self {
        MemoryExpr::Or(Box::new(self), Box::new(other))
    }

    pub fn is_null(self) -> Self {
        self.apply(MemoryOp::IsNull)
    }

    pub fn is_not_null(self) -> Self {
        self.apply(MemoryOp::IsNotNull)
    }

    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Eq, value.into()))
    }

    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Ne, value.into()))
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Gt, value.into()))
    }

    pub fn ge(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Ge, value.into()))
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Lt, value.into()))
    }

    pub fn le(self, value: impl Into<Value>) -> Self {
        self.apply(MemoryOp::Compare(CmpOp::Le, value.into()))
    }

    /// Appends `suffix` to every string.
    pub fn concat_str(self, suffix: impl Into<String>) -> Self {
        self.apply(MemoryOp::ConcatStr(suffix.into()))
    }

    /// Output name: the outermost alias, else the referenced column.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            MemoryExpr::Column(name) => Some(name),
            MemoryExpr::Alias { name, .. } => Some(name),
            MemoryExpr::Literal(_) => None,
            MemoryExpr::FillNull { expr, .. }
            | MemoryExpr::Cast { expr, .. }
            | MemoryExpr::Not(expr)
            | MemoryExpr::Apply { expr, .. } => expr.output_name(),
            MemoryExpr::And(left, _) | MemoryExpr::Or(left, _) => left.output_name(),
        }
    }
}

/// Category view handed to grouped operations.
#[derive(Clone, Debug)]
pub struct MemoryWrapper {
    pub category: Category,
    pub expr: MemoryExpr,
}

impl MemoryWrapper {
    pub fn apply(self, op: MemoryOp) -> MemoryExpr {
        self.expr.apply(op)
    }
}
