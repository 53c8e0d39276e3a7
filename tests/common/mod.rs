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
//! Shared fixtures for integration tests.

// Each test binary compiles this module separately and uses a subset.
#![allow(dead_code)]

use rowflow::{Row, Value};

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

pub fn int_rows(column: &str, values: impl IntoIterator<Item = i64>) -> Vec<Row> {
    values
        .into_iter()
        .map(|v| row(&[(column, Value::Int(v))]))
        .collect()
}

/// Left side of the user/person join fixtures: users known by name and email.
pub fn users() -> Vec<Row> {
    vec![
        row(&[
            ("name", Value::from("foo")),
            ("email", Value::from("foo@example.org")),
        ]),
        row(&[
            ("name", Value::from("bar")),
            ("email", Value::from("bar@example.org")),
        ]),
    ]
}

/// Right side of the user/person join fixtures: person records keyed by id.
/// Only the first one shares an email with a user.
pub fn people() -> Vec<Row> {
    vec![
        row(&[
            ("id", Value::Int(3)),
            ("email", Value::from("foo@example.org")),
        ]),
        row(&[
            ("id", Value::Int(5)),
            ("email", Value::from("silver@exaple.org")),
        ]),
    ]
}

/// Merge used by the join fixtures: the left row plus a `person_id` column
/// taken from the right side's id, null when there is no right side.
pub fn merge_person_id(left: &Row, right: Option<&Row>) -> anyhow::Result<Row> {
    let mut merged = Row::new();
    merged.copy_from(left);
    let person_id = match right {
        Some(r) => r.value("id").clone(),
        None => Value::Null,
    };
    merged.set("person_id", person_id);
    Ok(merged)
}

pub fn find_by<'a>(rows: &'a [Row], column: &str, value: &Value) -> Option<&'a Row> {
    rows.iter().find(|r| r.value(column).coerce_eq(value))
}
