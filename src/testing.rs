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

//! Assertion helpers for tests written against Dattrs schemas.

use crate::backend::{Backend, Frame};
use crate::schema::Schema;

/// Panics unless both frames have the same columns, rows and cells.
#[track_caller]
pub fn assert_frame_equal<F: Frame + PartialEq>(left: &F, right: &F) {
    let (left_columns, right_columns) = (left.columns(), right.columns());
    if left_columns != right_columns {
        panic!("frame columns differ\n  left:  {left_columns:?}\n  right: {right_columns:?}");
    }
    if left.row_count() != right.row_count() {
        panic!(
            "frame heights differ: left has {} rows, right has {}",
            left.row_count(),
            right.row_count()
        );
    }
    if left != right {
        panic!("frame contents differ\n  left:  {left:?}\n  right: {right:?}");
    }
}

/// Panics unless both schemas declare the same fields the same way.
///
/// Steps are compared by name; hooks are not compared.
#[track_caller]
pub fn assert_schema_equal<B: Backend>(left: &Schema<B>, right: &Schema<B>) {
    let (left_fields, right_fields) = (left.describe(), right.describe());
    if left_fields.len() != right_fields.len() {
        panic!(
            "schemas declare {} and {} fields\n  left:  {:?}\n  right: {:?}",
            left_fields.len(),
            right_fields.len(),
            left.aliases(),
            right.aliases()
        );
    }
    for (l, r) in left_fields.iter().zip(&right_fields) {
        if l != r {
            panic!("field '{}' differs\n  left:  {l:?}\n  right: {r:?}", l.name);
        }
    }
}
