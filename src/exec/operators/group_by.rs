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
//! Group-by accumulation.
//!
//! Responsibilities:
//! - Buckets rows by the values of one or more key columns (coercing
//!   equality) and emits one group row per bucket at completion, in
//!   first-seen order.
//! - A group row carries the key columns plus the collected member rows
//!   under the reserved `GROUP_MEMBERS` column; an optional aggregate
//!   callback folds each member into its group row as it arrives.
//!
//! Key exported interfaces:
//! - Types: `GroupByOperation`.
//! - Traits: `GroupRowExt`.
//! - Constants: `GROUP_MEMBERS`, `GROUP_PARENT`.

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::row::{Row, Value};

/// Reserved column holding a group row's member rows.
pub const GROUP_MEMBERS: &str = "__group_members";

/// Reserved column stamped onto dispatched member rows, referencing their
/// parent group row.
pub const GROUP_PARENT: &str = "__group_parent";

type AggregateFn = Box<dyn FnMut(&mut Row, &Row) -> Result<()> + Send>;

/// Buckets the stream by key columns; emits group rows at completion.
pub struct GroupByOperation {
    columns: Vec<String>,
    aggregate: Option<AggregateFn>,
    groups: Vec<Row>,
}

impl GroupByOperation {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            aggregate: None,
            groups: Vec::new(),
        }
    }

    /// Fold each arriving member into its group row, e.g. to maintain a sum
    /// or count column. Runs before the member is appended, so on the first
    /// row of a group the group row holds only the key columns.
    pub fn with_aggregate<F>(mut self, aggregate: F) -> Self
    where
        F: FnMut(&mut Row, &Row) -> Result<()> + Send + 'static,
    {
        self.aggregate = Some(Box::new(aggregate));
        self
    }
}

impl Operation for GroupByOperation {
    fn name(&self) -> &str {
        "group_by"
    }

    fn on_row(&mut self, row: Row) -> Result<Emit> {
        let columns = &self.columns;
        let idx = self
            .groups
            .iter()
            .position(|g| columns.iter().all(|c| g.value(c).coerce_eq(row.value(c))));
        let group = match idx {
            Some(i) => &mut self.groups[i],
            None => {
                let mut g = Row::new();
                for c in &self.columns {
                    g.set(c.clone(), row.value(c).clone());
                }
                g.set(GROUP_MEMBERS, Value::Rows(Vec::new()));
                self.groups.push(g);
                self.groups.last_mut().expect("group just pushed")
            }
        };
        if let Some(aggregate) = &mut self.aggregate {
            aggregate(group, &row)?;
        }
        if let Some(Value::Rows(members)) = group.get_mut(GROUP_MEMBERS) {
            members.push(row);
        }
        Ok(Emit::Skip)
    }

    fn on_completed(&mut self) -> Result<Vec<Row>> {
        Ok(std::mem::take(&mut self.groups))
    }
}

/// Read access to the reserved group columns.
pub trait GroupRowExt {
    /// The member rows of a group row, if this is one.
    fn group_members(&self) -> Option<&[Row]>;
    /// The parent group of a dispatched member row, if this is one.
    fn group_parent(&self) -> Option<&Row>;
}

impl GroupRowExt for Row {
    fn group_members(&self) -> Option<&[Row]> {
        self.get_opt(GROUP_MEMBERS)?.as_rows()
    }

    fn group_parent(&self) -> Option<&Row> {
        match self.get_opt(GROUP_PARENT)? {
            Value::Row(parent) => Some(parent.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(region: &str, amount: i64) -> Row {
        let mut r = Row::new();
        r.set("region", region).set("amount", amount);
        r
    }

    fn feed(op: &mut GroupByOperation, rows: Vec<Row>) -> Vec<Row> {
        for r in rows {
            assert!(matches!(op.on_row(r).expect("group row"), Emit::Skip));
        }
        op.on_completed().expect("flush groups")
    }

    #[test]
    fn groups_in_first_seen_order() {
        let mut op = GroupByOperation::new(vec!["region".to_string()]);
        let groups = feed(
            &mut op,
            vec![row("east", 1), row("west", 2), row("east", 3)],
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(*groups[0].value("region"), Value::from("east"));
        assert_eq!(*groups[1].value("region"), Value::from("west"));
        assert_eq!(groups[0].group_members().expect("members").len(), 2);
        assert_eq!(groups[1].group_members().expect("members").len(), 1);
    }

    #[test]
    fn aggregate_folds_members() {
        let op = GroupByOperation::new(vec!["region".to_string()]);
        let mut op = op.with_aggregate(|group, member| {
            let total = group.value("total").as_i64().unwrap_or(0);
            let amount = member.value("amount").as_i64().unwrap_or(0);
            group.set("total", total + amount);
            Ok(())
        });
        let groups = feed(&mut op, vec![row("east", 1), row("east", 3)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(*groups[0].value("total"), Value::Int(4));
    }

    #[test]
    fn multi_column_keys_bucket_independently() {
        let mut op = GroupByOperation::new(vec!["region".to_string(), "amount".to_string()]);
        let groups = feed(&mut op, vec![row("east", 1), row("east", 2), row("east", 1)]);
        assert_eq!(groups.len(), 2);
    }
}
