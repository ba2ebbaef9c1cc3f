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

//! # Operation Namespace Module
//!
//! Composable, two-phase expression operations.
//!
//! A backend publishes its operations once, in an [`OperationRegistry`]
//! mapping names to function pointers. An [`OperationNamespace`] looks names
//! up in that registry and hands back a [`BoundOperation`]: the operation
//! with its arguments fixed ahead of time, applied later to exactly one
//! expression handle.
//!
//! ```rust,ignore
//! let ns = MemoryBackend::namespace();
//!
//! // expr.str.to_datetime(format="%m-%d-%Y"), declared once, applied later
//! let parse = ns
//!     .category(Category::Text)
//!     .resolve("to_datetime")?
//!     .with_kwargs(Map::from_iter([("format".to_string(), json!("%m-%d-%Y"))]));
//! let expr = parse.invoke(MemoryBackend::col("a"))?;
//! ```
//!
//! Operations resolved inside a category (`str`, `dt`, `list`, `struct`,
//! `cat`) require wrapping: invocation first asks the backend for the
//! category view of the expression, then calls the operation on that view.
//! Root operations receive the expression as their first argument.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::Backend;
use crate::errors::{DattrsError, Result};

/// Grouped operation families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `str`
    Text,
    /// `dt`
    Temporal,
    /// `list`
    List,
    /// `struct`
    Structured,
    /// `cat`
    Categorical,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Text,
        Category::Temporal,
        Category::List,
        Category::Structured,
        Category::Categorical,
    ];

    /// Short name used in dotted operation paths.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "str",
            Category::Temporal => "dt",
            Category::List => "list",
            Category::Structured => "struct",
            Category::Categorical => "cat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DattrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "str" | "text" | "string" => Ok(Category::Text),
            "dt" | "temporal" | "datetime" => Ok(Category::Temporal),
            "list" => Ok(Category::List),
            "struct" | "structured" => Ok(Category::Structured),
            "cat" | "categorical" => Ok(Category::Categorical),
            _ => Err(DattrsError::unknown_operation(s, ROOT_NAMESPACE)),
        }
    }
}

const ROOT_NAMESPACE: &str = "expr";

/// Positional and keyword arguments fixed on a [`BoundOperation`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Arguments {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Looks a parameter up by position first, then by keyword.
    pub fn get(&self, position: usize, key: &str) -> Option<&Value> {
        self.args.get(position).or_else(|| self.kwargs.get(key))
    }

    /// Like [`Arguments::get`], but a missing parameter is an error.
    pub fn require(&self, operation: &str, position: usize, key: &str) -> Result<&Value> {
        self.get(position, key).ok_or_else(|| {
            DattrsError::invalid_arguments(
                operation,
                format!("missing parameter '{key}' (position {position})"),
            )
        })
    }
}

/// Root operation: receives the expression as its first argument.
pub type DirectFn<B> = fn(<B as Backend>::Expr, &Arguments) -> Result<<B as Backend>::Expr>;

/// Category operation: receives the backend's category view of the expression.
pub type WrappedFn<B> = fn(<B as Backend>::Wrapper, &Arguments) -> Result<<B as Backend>::Expr>;

/// Function pointer stored in a registry entry.
pub enum OperationFn<B: Backend> {
    Direct(DirectFn<B>),
    Wrapped(WrappedFn<B>),
}

impl<B: Backend> Clone for OperationFn<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend> Copy for OperationFn<B> {}

impl<B: Backend> fmt::Debug for OperationFn<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationFn::Direct(_) => f.write_str("Direct"),
            OperationFn::Wrapped(_) => f.write_str("Wrapped"),
        }
    }
}

/// Registry mapping operation names to their function pointers.
///
/// Built once per backend and shared behind an `Arc`; it is not mutated once
/// a namespace has been created from it.
pub struct OperationRegistry<B: Backend> {
    direct: HashMap<String, DirectFn<B>>,
    wrapped: HashMap<Category, HashMap<String, WrappedFn<B>>>,
}

impl<B: Backend> Default for OperationRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for OperationRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("direct", &self.names(None))
            .field("categories", &self.wrapped.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<B: Backend> OperationRegistry<B> {
    pub fn new() -> Self {
        OperationRegistry {
            direct: HashMap::new(),
            wrapped: HashMap::new(),
        }
    }

    /// Registers a root operation.
    pub fn register(&mut self, name: &str, function: DirectFn<B>) -> &mut Self {
        self.direct.insert(name.to_string(), function);
        self
    }

    /// Registers an operation under `category`.
    pub fn register_in(&mut self, category: Category, name: &str, function: WrappedFn<B>) -> &mut Self {
        self.wrapped
            .entry(category)
            .or_default()
            .insert(name.to_string(), function);
        self
    }

    pub fn get(&self, category: Option<Category>, name: &str) -> Result<OperationFn<B>> {
        let found = match category {
            None => self.direct.get(name).copied().map(OperationFn::Direct),
            Some(category) => self
                .wrapped
                .get(&category)
                .and_then(|entries| entries.get(name))
                .copied()
                .map(OperationFn::Wrapped),
        };
        found.ok_or_else(|| {
            DattrsError::unknown_operation(
                name,
                category.map(|c| c.as_str()).unwrap_or(ROOT_NAMESPACE),
            )
        })
    }

    pub fn contains(&self, category: Option<Category>, name: &str) -> bool {
        self.get(category, name).is_ok()
    }

    /// Sorted operation names exposed under `category` (root when `None`).
    pub fn names(&self, category: Option<Category>) -> Vec<String> {
        let mut names: Vec<String> = match category {
            None => self.direct.keys().cloned().collect(),
            Some(category) => self
                .wrapped
                .get(&category)
                .map(|entries| entries.keys().cloned().collect())
                .unwrap_or_default(),
        };
        names.sort();
        names
    }

    pub fn into_namespace(self) -> OperationNamespace<B> {
        OperationNamespace::new(Arc::new(self))
    }
}

/// Lookup surface resolving operation names to [`BoundOperation`]s.
pub struct OperationNamespace<B: Backend> {
    registry: Arc<OperationRegistry<B>>,
    category: Option<Category>,
}

impl<B: Backend> Clone for OperationNamespace<B> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            category: self.category,
        }
    }
}

impl<B: Backend> fmt::Debug for OperationNamespace<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNamespace")
            .field("category", &self.category)
            .finish()
    }
}

impl<B: Backend> OperationNamespace<B> {
    pub fn new(registry: Arc<OperationRegistry<B>>) -> Self {
        Self {
            registry,
            category: None,
        }
    }

    /// Name used in error messages: `expr` at the root, else the category.
    pub fn name(&self) -> &'static str {
        self.category.map(|c| c.as_str()).unwrap_or(ROOT_NAMESPACE)
    }

    pub fn current_category(&self) -> Option<Category> {
        self.category
    }

    /// Sub-namespace for a grouped operation family.
    pub fn category(&self, category: Category) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            category: Some(category),
        }
    }

    /// Sub-namespace looked up by its short or long name.
    pub fn category_named(&self, name: &str) -> Result<Self> {
        Ok(self.category(name.parse()?))
    }

    /// Resolves `name` without binding any arguments.
    pub fn resolve(&self, name: &str) -> Result<BoundOperation<B>> {
        let function = self.registry.get(self.category, name)?;
        Ok(BoundOperation {
            name: name.to_string(),
            category: self.category,
            arguments: Arguments::default(),
            function,
        })
    }

    /// Resolves a dotted path: `"is_unique"` or `"str.to_uppercase"`.
    pub fn resolve_path(&self, path: &str) -> Result<BoundOperation<B>> {
        match (self.category, path.split_once('.')) {
            (None, Some((category, name))) => self.category_named(category)?.resolve(name),
            _ => self.resolve(path),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(self.category, name)
    }

    /// Operation names available in this namespace.
    pub fn operations(&self) -> Vec<String> {
        self.registry.names(self.category)
    }
}

/// Named backend operation with its arguments fixed ahead of application.
///
/// Binding never executes the operation and never mutates the receiver: it
/// returns a new value. Re-binding replaces the previous arguments instead of
/// merging with them.
pub struct BoundOperation<B: Backend> {
    name: String,
    category: Option<Category>,
    arguments: Arguments,
    function: OperationFn<B>,
}

impl<B: Backend> Clone for BoundOperation<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            category: self.category,
            arguments: self.arguments.clone(),
            function: self.function,
        }
    }
}

impl<B: Backend> fmt::Debug for BoundOperation<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("name", &self.qualified_name())
            .field("arguments", &self.arguments)
            .field("requires_wrap", &self.requires_wrap())
            .finish()
    }
}

impl<B: Backend> BoundOperation<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// `"str.to_uppercase"` for category operations, `"is_unique"` otherwise.
    pub fn qualified_name(&self) -> String {
        match self.category {
            Some(category) => format!("{}.{}", category, self.name),
            None => self.name.clone(),
        }
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Whether invocation goes through the backend's category view.
    pub fn requires_wrap(&self) -> bool {
        matches!(self.function, OperationFn::Wrapped(_))
    }

    /// Returns a copy with `args` and `kwargs` fixed, replacing any earlier binding.
    pub fn bind(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self {
            arguments: Arguments::new(args, kwargs),
            ..self.clone()
        }
    }

    /// Returns a copy bound to positional arguments only.
    pub fn with_args(&self, args: Vec<Value>) -> Self {
        self.bind(args, Map::new())
    }

    /// Returns a copy bound to keyword arguments only.
    pub fn with_kwargs(&self, kwargs: Map<String, Value>) -> Self {
        self.bind(Vec::new(), kwargs)
    }

    /// Applies the operation to one expression handle.
    pub fn invoke(&self, expr: B::Expr) -> Result<B::Expr> {
        match self.function {
            OperationFn::Direct(function) => function(expr, &self.arguments),
            OperationFn::Wrapped(function) => {
                // Only reachable through a category namespace.
                let category = self.category.ok_or_else(|| {
                    DattrsError::internal(format!("operation '{}' has no category", self.name))
                })?;
                function(B::wrap(expr, category), &self.arguments)
            }
        }
    }
}
