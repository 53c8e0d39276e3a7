// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
//! The join operation.
//!
//! Responsibilities:
//! - Joins the observed (left) stream against a fully materialized right
//!   side: either fixed rows or a separate pipeline drained on demand.
//! - First-match semantics: each left row pairs with at most the first right
//!   row the match condition accepts. Matched right rows are remembered by
//!   index; at completion, outer variants emit still-unmatched right rows
//!   that match against an empty left row.
//! - `FieldMatcher` provides the standard single-field conditions for the
//!   four join types; arbitrary closures work too.
//!
//! Key exported interfaces:
//! - Types: `JoinType`, `FieldMatcher`, `JoinSource`, `JoinOperation`.
//! - Functions: `merge_rows`.

use std::collections::HashSet;

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::exec::pipeline::OpHandle;
use crate::row::Row;

/// The four join flavors expressible with [`FieldMatcher`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// Single-field match condition for the standard join types.
///
/// A null key is treated as a wildcard on the side the join preserves: a
/// right join matches left rows whose key is null against any right row, and
/// a left join matches any left row against right rows whose key is null.
/// The full variant does both.
#[derive(Clone, Debug)]
pub struct FieldMatcher {
    join_type: JoinType,
    left_field: String,
    right_field: String,
}

impl FieldMatcher {
    pub fn new(
        join_type: JoinType,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }

    /// Evaluate the condition. `right` is `None` when asking whether an
    /// unmatched left row should be preserved.
    pub fn matches(&self, left: &Row, right: Option<&Row>) -> bool {
        let lv = left.value(&self.left_field);
        match self.join_type {
            JoinType::Inner => {
                right.is_some_and(|r| lv.coerce_eq(r.value(&self.right_field)))
            }
            JoinType::Left => match right {
                None => true,
                Some(r) => {
                    let rv = r.value(&self.right_field);
                    rv.is_null() || lv.coerce_eq(rv)
                }
            },
            JoinType::Right => {
                right.is_some_and(|r| lv.is_null() || lv.coerce_eq(r.value(&self.right_field)))
            }
            JoinType::Full => match right {
                None => true,
                Some(r) => {
                    let rv = r.value(&self.right_field);
                    lv.is_null() || rv.is_null() || lv.coerce_eq(rv)
                }
            },
        }
    }
}

/// Where a join's right side comes from.
pub enum JoinSource {
    /// Fixed, already materialized rows.
    Rows(Vec<Row>),
    /// A node of a separate pipeline, drained to completion the first time
    /// the join needs it.
    Operation(OpHandle),
}

impl From<Vec<Row>> for JoinSource {
    fn from(rows: Vec<Row>) -> Self {
        JoinSource::Rows(rows)
    }
}

impl From<OpHandle> for JoinSource {
    fn from(handle: OpHandle) -> Self {
        JoinSource::Operation(handle)
    }
}

/// The default merge: a fresh row carrying every left column, overlaid with
/// every right column. Right columns win on name collisions.
pub fn merge_rows(left: &Row, right: Option<&Row>) -> Row {
    let mut merged = Row::new();
    merged.copy_from(left);
    if let Some(right) = right {
        merged.overlay(right);
    }
    merged
}

type MatchFn = Box<dyn FnMut(&Row, Option<&Row>) -> bool + Send>;
type MergeFn = Box<dyn FnMut(&Row, Option<&Row>) -> Result<Row> + Send>;

/// Joins the observed stream against a materialized right side.
pub struct JoinOperation {
    right: Option<JoinSource>,
    buffered: Option<Vec<Row>>,
    matched: HashSet<usize>,
    matcher: MatchFn,
    merge: MergeFn,
}

impl JoinOperation {
    pub fn new<M, G>(right: impl Into<JoinSource>, matcher: M, merge: G) -> Self
    where
        M: FnMut(&Row, Option<&Row>) -> bool + Send + 'static,
        G: FnMut(&Row, Option<&Row>) -> Result<Row> + Send + 'static,
    {
        Self {
            right: Some(right.into()),
            buffered: None,
            matched: HashSet::new(),
            matcher: Box::new(matcher),
            merge: Box::new(merge),
        }
    }

    /// Standard join on one field per side with the default merge.
    pub fn on_fields(
        right: impl Into<JoinSource>,
        matcher: FieldMatcher,
    ) -> Self {
        Self::new(
            right,
            move |l, r| matcher.matches(l, r),
            |l, r| Ok(merge_rows(l, r)),
        )
    }

    /// Materialize the right side if not done yet. A right-side pipeline is
    /// drained through its own graph; its row-level errors are logged, not
    /// merged into the left run.
    fn ensure_right(&mut self) {
        if self.buffered.is_some() {
            return;
        }
        let rows = match self.right.take() {
            Some(JoinSource::Rows(rows)) => rows,
            Some(JoinSource::Operation(handle)) => {
                let result = handle.record();
                if result.error_count() > 0 {
                    tracing::warn!(
                        errors = result.error_count(),
                        "join right side recorded errors"
                    );
                }
                result.into_rows()
            }
            None => Vec::new(),
        };
        tracing::debug!(rows = rows.len(), "join right side materialized");
        self.buffered = Some(rows);
    }
}

impl Operation for JoinOperation {
    fn name(&self) -> &str {
        "join"
    }

    fn on_row(&mut self, left: Row) -> Result<Emit> {
        self.ensure_right();
        let rows = self.buffered.as_deref().expect("right side materialized");
        let matcher = &mut self.matcher;
        match rows.iter().position(|right| matcher(&left, Some(right))) {
            Some(idx) => {
                self.matched.insert(idx);
                Ok(Emit::Row((self.merge)(&left, Some(&rows[idx]))?))
            }
            None => {
                if matcher(&left, None) {
                    Ok(Emit::Row((self.merge)(&left, None)?))
                } else {
                    Ok(Emit::Skip)
                }
            }
        }
    }

    fn on_completed(&mut self) -> Result<Vec<Row>> {
        self.ensure_right();
        let rows = self.buffered.as_deref().expect("right side materialized");
        let matcher = &mut self.matcher;
        let merge = &mut self.merge;
        // Unmatched right rows are re-checked against an empty left row, so
        // only the right-preserving conditions let them through.
        let empty = Row::new();
        let mut flushed = Vec::new();
        for (idx, right) in rows.iter().enumerate() {
            if self.matched.contains(&idx) {
                continue;
            }
            if matcher(&empty, Some(right)) {
                flushed.push(merge(&empty, Some(right))?);
            }
        }
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Value;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn inner_requires_equal_keys() {
        let m = FieldMatcher::new(JoinType::Inner, "email", "email");
        let l = row(&[("email", Value::from("a@x"))]);
        let r_hit = row(&[("email", Value::from("a@x"))]);
        let r_miss = row(&[("email", Value::from("b@x"))]);
        assert!(m.matches(&l, Some(&r_hit)));
        assert!(!m.matches(&l, Some(&r_miss)));
        assert!(!m.matches(&l, None));
    }

    #[test]
    fn inner_matches_null_to_null() {
        let m = FieldMatcher::new(JoinType::Inner, "k", "k");
        let l = row(&[("k", Value::Null)]);
        let r = row(&[("k", Value::Null)]);
        assert!(m.matches(&l, Some(&r)));
    }

    #[test]
    fn left_preserves_unmatched_left_rows() {
        let m = FieldMatcher::new(JoinType::Left, "k", "k");
        let l = row(&[("k", Value::Int(1))]);
        assert!(m.matches(&l, None));
        let r_null = row(&[("k", Value::Null)]);
        assert!(m.matches(&l, Some(&r_null)));
    }

    #[test]
    fn right_matches_null_left_key_to_any_right_row() {
        let m = FieldMatcher::new(JoinType::Right, "k", "k");
        let l_null = row(&[("k", Value::Null)]);
        let r = row(&[("k", Value::Int(9))]);
        assert!(m.matches(&l_null, Some(&r)));
        assert!(!m.matches(&l_null, None));
    }

    #[test]
    fn full_preserves_both_sides() {
        let m = FieldMatcher::new(JoinType::Full, "k", "k");
        let l = row(&[("k", Value::Int(1))]);
        let r_miss = row(&[("k", Value::Int(2))]);
        assert!(!m.matches(&l, Some(&r_miss)));
        assert!(m.matches(&l, None));
        let empty = Row::new();
        assert!(m.matches(&empty, Some(&r_miss)));
    }

    #[test]
    fn default_merge_lets_right_columns_win() {
        let l = row(&[("id", Value::Int(1)), ("name", Value::from("foo"))]);
        let r = row(&[("name", Value::from("bar")), ("age", Value::Int(3))]);
        let merged = merge_rows(&l, Some(&r));
        assert_eq!(*merged.value("id"), Value::Int(1));
        assert_eq!(*merged.value("name"), Value::from("bar"));
        assert_eq!(*merged.value("age"), Value::Int(3));
    }
}
