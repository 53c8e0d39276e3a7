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
//! Group member dispatch.

use std::sync::Arc;

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::exec::operators::group_by::{GROUP_MEMBERS, GROUP_PARENT};
use crate::row::{Row, Value};

/// Unpacks group rows back into their member rows, stamping each member with
/// a shared reference to its parent group under `GROUP_PARENT`. The parent
/// carries the key and aggregate columns; its member list is stripped so
/// members do not drag the whole group along. Non-group rows pass through.
pub struct DispatchGroupOperation;

impl Operation for DispatchGroupOperation {
    fn name(&self) -> &str {
        "dispatch_group"
    }

    fn on_row(&mut self, mut group: Row) -> Result<Emit> {
        match group.remove(GROUP_MEMBERS) {
            Some(Value::Rows(members)) => {
                let parent = Arc::new(group);
                let rows = members
                    .into_iter()
                    .map(|mut member| {
                        member.set(GROUP_PARENT, Value::Row(Arc::clone(&parent)));
                        member
                    })
                    .collect();
                Ok(Emit::Rows(rows))
            }
            Some(other) => {
                group.set(GROUP_MEMBERS, other);
                Ok(Emit::Row(group))
            }
            None => Ok(Emit::Row(group)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::operators::group_by::GroupRowExt;

    #[test]
    fn members_come_back_out_with_their_parent() {
        let mut member_a = Row::new();
        member_a.set("n", 1);
        let mut member_b = Row::new();
        member_b.set("n", 2);
        let mut group = Row::new();
        group
            .set("region", "east")
            .set(GROUP_MEMBERS, Value::Rows(vec![member_a, member_b]));

        let mut op = DispatchGroupOperation;
        let Emit::Rows(rows) = op.on_row(group).expect("dispatch") else {
            panic!("expected member rows");
        };
        assert_eq!(rows.len(), 2);
        let parent = rows[0].group_parent().expect("parent");
        assert_eq!(*parent.value("region"), Value::from("east"));
        assert!(!parent.contains(GROUP_MEMBERS));
    }

    #[test]
    fn non_group_rows_pass_through() {
        let mut row = Row::new();
        row.set("n", 1);
        let mut op = DispatchGroupOperation;
        let Emit::Row(out) = op.on_row(row).expect("pass through") else {
            panic!("expected one row");
        };
        assert_eq!(*out.value("n"), Value::Int(1));
    }
}
