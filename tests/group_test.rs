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

mod common;

use common::row;
use rowflow::{GroupRowExt, Pipeline, Value};

fn sales() -> Vec<rowflow::Row> {
    vec![
        row(&[("region", Value::from("east")), ("amount", Value::Int(10))]),
        row(&[("region", Value::from("west")), ("amount", Value::Int(5))]),
        row(&[("region", Value::from("east")), ("amount", Value::Int(7))]),
        row(&[("region", Value::from("west")), ("amount", Value::Int(1))]),
        row(&[("region", Value::from("east")), ("amount", Value::Int(2))]),
    ]
}

#[test]
fn group_rows_flow_out_at_completion_in_first_seen_order() {
    let out = Pipeline::from_rows(sales())
        .group_by(["region"])
        .record()
        .into_rows();
    assert_eq!(out.len(), 2);
    assert_eq!(*out[0].value("region"), Value::from("east"));
    assert_eq!(out[0].group_members().expect("members").len(), 3);
    assert_eq!(*out[1].value("region"), Value::from("west"));
    assert_eq!(out[1].group_members().expect("members").len(), 2);
}

#[test]
fn aggregate_maintains_per_group_totals() {
    let out = Pipeline::from_rows(sales())
        .group_by_aggregate(["region"], |group, member| {
            let total = group.value("total").as_i64().unwrap_or(0);
            let amount = member.value("amount").as_i64().unwrap_or(0);
            group.set("total", total + amount);
            Ok(())
        })
        .record()
        .into_rows();
    assert_eq!(out.len(), 2);
    assert_eq!(*out[0].value("total"), Value::Int(19));
    assert_eq!(*out[1].value("total"), Value::Int(6));
}

#[test]
fn groups_keep_flowing_through_downstream_operations() {
    let out = Pipeline::from_rows(sales())
        .group_by(["region"])
        .filter(|g| g.group_members().is_some_and(|m| m.len() >= 3))
        .record()
        .into_rows();
    assert_eq!(out.len(), 1);
    assert_eq!(*out[0].value("region"), Value::from("east"));
}

#[test]
fn dispatch_group_restores_members_with_parent_reference() {
    let out = Pipeline::from_rows(sales())
        .group_by_aggregate(["region"], |group, member| {
            let total = group.value("total").as_i64().unwrap_or(0);
            let amount = member.value("amount").as_i64().unwrap_or(0);
            group.set("total", total + amount);
            Ok(())
        })
        .dispatch_group()
        .record()
        .into_rows();
    // All five member rows come back out, each pointing at its group.
    assert_eq!(out.len(), 5);
    let first = &out[0];
    assert_eq!(*first.value("amount"), Value::Int(10));
    let parent = first.group_parent().expect("parent group");
    assert_eq!(*parent.value("region"), Value::from("east"));
    assert_eq!(*parent.value("total"), Value::Int(19));
    // The parent does not drag the member list along.
    assert!(parent.group_members().is_none());
}

#[test]
fn group_key_comparison_coerces_numeric_representations() {
    let rows = vec![
        row(&[("bucket", Value::Int(1))]),
        row(&[("bucket", Value::from("1"))]),
        row(&[("bucket", Value::Float(1.0))]),
    ];
    let out = Pipeline::from_rows(rows)
        .group_by(["bucket"])
        .record()
        .into_rows();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].group_members().expect("members").len(), 3);
}
