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

//! Expression steps used as converters and validators.

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use crate::backend::Backend;
use crate::errors::Result;
use crate::namespace::BoundOperation;

/// User-supplied expression transform.
pub type ExprFn<B> =
    Arc<dyn Fn(<B as Backend>::Expr) -> Result<<B as Backend>::Expr> + Send + Sync>;

/// One expression-to-expression step.
///
/// As a converter the output replaces the column; as a validator the output
/// is a boolean predicate over the column.
pub enum ExprStep<B: Backend> {
    /// Registry operation with bound arguments.
    Operation(BoundOperation<B>),
    /// Named closure for computations the registry does not expose.
    Custom { name: String, function: ExprFn<B> },
    /// Logical negation of the inner step's output.
    Negate(Box<ExprStep<B>>),
}

impl<B: Backend> ExprStep<B> {
    pub fn custom<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(B::Expr) -> Result<B::Expr> + Send + Sync + 'static,
    {
        ExprStep::Custom {
            name: name.into(),
            function: Arc::new(function),
        }
    }

    /// Display name: the operation path, the closure name, or `~inner`.
    pub fn name(&self) -> String {
        match self {
            ExprStep::Operation(operation) => operation.qualified_name(),
            ExprStep::Custom { name, .. } => name.clone(),
            ExprStep::Negate(inner) => format!("~{}", inner.name()),
        }
    }

    pub fn apply(&self, expr: B::Expr) -> Result<B::Expr> {
        match self {
            ExprStep::Operation(operation) => operation.invoke(expr),
            ExprStep::Custom { function, .. } => function(expr),
            ExprStep::Negate(inner) => inner.apply(expr).map(B::not),
        }
    }
}

impl<B: Backend> Clone for ExprStep<B> {
    fn clone(&self) -> Self {
        match self {
            ExprStep::Operation(operation) => ExprStep::Operation(operation.clone()),
            ExprStep::Custom { name, function } => ExprStep::Custom {
                name: name.clone(),
                function: Arc::clone(function),
            },
            ExprStep::Negate(inner) => ExprStep::Negate(inner.clone()),
        }
    }
}

impl<B: Backend> fmt::Debug for ExprStep<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprStep::Operation(operation) => operation.fmt(f),
            ExprStep::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
            ExprStep::Negate(inner) => f.debug_tuple("Negate").field(inner).finish(),
        }
    }
}

impl<B: Backend> From<BoundOperation<B>> for ExprStep<B> {
    fn from(operation: BoundOperation<B>) -> Self {
        ExprStep::Operation(operation)
    }
}

impl<B: Backend> Not for ExprStep<B> {
    type Output = ExprStep<B>;

    fn not(self) -> Self::Output {
        ExprStep::Negate(Box::new(self))
    }
}

impl<B: Backend> Not for BoundOperation<B> {
    type Output = ExprStep<B>;

    fn not(self) -> Self::Output {
        !ExprStep::Operation(self)
    }
}

/// Threads `expr` through `steps` left to right.
pub fn fold_steps<B: Backend>(steps: &[ExprStep<B>], expr: B::Expr) -> Result<B::Expr> {
    steps.iter().try_fold(expr, |current, step| step.apply(current))
}
