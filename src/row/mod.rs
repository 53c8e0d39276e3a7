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
//! The row data model.
//!
//! Responsibilities:
//! - `Row` is a schema-less, ordered, case-insensitive column map. Column
//!   order is insertion order; an update in place keeps the original position
//!   and original key casing.
//! - Lookup of an absent column resolves per the row's missing-key policy:
//!   lenient rows yield null, strict rows yield `Error::MissingKey`.
//! - Row equality is set semantics over (column, value) pairs under coercing
//!   value equality.
//!
//! Key exported interfaces:
//! - Types: `Row`, `MissingPolicy`, `RowKey`, `Value`.

pub mod key;
pub mod record;
pub mod value;

use std::fmt;

pub use key::RowKey;
pub use value::Value;

use crate::common::error::{Error, Result};
use crate::row::value::NULL;

/// What a lookup of an absent column yields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MissingPolicy {
    /// Absent columns read as null.
    #[default]
    Null,
    /// Absent columns fail the lookup with `Error::MissingKey`.
    Error,
}

/// A single unit of data flowing through a pipeline.
#[derive(Clone, Debug, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
    missing: MissingPolicy,
}

impl Row {
    /// An empty row with the lenient missing-key policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty row that fails lookups of absent columns.
    pub fn strict() -> Self {
        Self {
            columns: Vec::new(),
            missing: MissingPolicy::Error,
        }
    }

    pub fn missing_policy(&self) -> MissingPolicy {
        self.missing
    }

    pub fn set_missing_policy(&mut self, policy: MissingPolicy) -> &mut Self {
        self.missing = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Look up a column, honoring the missing-key policy.
    pub fn get(&self, key: &str) -> Result<&Value> {
        match self.position(key) {
            Some(idx) => Ok(&self.columns[idx].1),
            None => match self.missing {
                MissingPolicy::Null => Ok(&NULL),
                MissingPolicy::Error => Err(Error::MissingKey(key.to_string())),
            },
        }
    }

    /// Look up a column; `None` when absent regardless of policy.
    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|idx| &self.columns[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.position(key).map(|idx| &mut self.columns[idx].1)
    }

    /// Look up a column leniently: absent columns read as null regardless of
    /// the row's policy. Join and group-by matching use this form.
    pub fn value(&self, key: &str) -> &Value {
        self.get_opt(key).unwrap_or(&NULL)
    }

    /// Insert or update a column. Updating keeps the column's position and
    /// the casing of the first insertion.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.columns[idx].1 = value,
            None => self.columns.push((key, value)),
        }
        self
    }

    /// Remove a column, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|idx| self.columns.remove(idx).1)
    }

    /// Snapshot of column names in order. Stable against mutation of the row
    /// while the caller iterates.
    pub fn columns(&self) -> Vec<String> {
        self.columns.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace this row's contents with a copy of `other`'s columns. The
    /// missing-key policy is kept; afterwards the rows compare equal.
    pub fn copy_from(&mut self, other: &Row) -> &mut Self {
        self.columns.clear();
        self.overlay(other)
    }

    /// Overlay every column of `other` onto this row, keeping columns the
    /// source does not name. This is the merge building block; `copy_from`
    /// is the replacing variant.
    pub fn overlay(&mut self, other: &Row) -> &mut Self {
        for (k, v) in other.iter() {
            self.set(k, v.clone());
        }
        self
    }

    /// Snapshot the named columns into a hashable key. Absent columns
    /// contribute null parts.
    pub fn create_key(&self, columns: &[&str]) -> RowKey {
        RowKey::new(columns.iter().map(|c| self.value(c).clone()).collect())
    }

    /// JSON projection of the row, used for typed record extraction.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (k, v) in self.iter() {
            map.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Row {
    /// Set semantics: same column count, and every (column, value) pair of
    /// one row matches the other under case-insensitive names and coercing
    /// value equality. Column order does not matter.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get_opt(k).is_some_and(|ov| v.coerce_eq(ov)))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut row = Row::new();
        row.set("Email", "foo@example.org");
        assert_eq!(*row.value("email"), Value::from("foo@example.org"));
        assert_eq!(*row.value("EMAIL"), Value::from("foo@example.org"));
    }

    #[test]
    fn update_keeps_position_and_casing() {
        let mut row = Row::new();
        row.set("Name", "foo").set("Age", 30);
        row.set("name", "bar");
        assert_eq!(row.columns(), vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(*row.value("NAME"), Value::from("bar"));
    }

    #[test]
    fn lenient_missing_reads_null() {
        let row = Row::new();
        assert!(row.get("absent").expect("lenient lookup").is_null());
        assert!(row.value("absent").is_null());
    }

    #[test]
    fn strict_missing_fails_lookup() {
        let row = Row::strict();
        let err = row.get("absent").expect_err("strict lookup must fail");
        assert_eq!(err.to_string(), "could not find key: absent");
        // The lenient accessor stays lenient even on strict rows.
        assert!(row.value("absent").is_null());
    }

    #[test]
    fn equality_ignores_column_order() {
        let a: Row = [("a", Value::Int(1)), ("b", Value::from("x"))]
            .into_iter()
            .collect();
        let b: Row = [("B", Value::from("x")), ("A", Value::Int(1))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn equality_coerces_values() {
        let a: Row = [("n", Value::Int(5))].into_iter().collect();
        let b: Row = [("n", Value::from("5"))].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn copying_a_row_replaces_its_contents() {
        let mut a: Row = [("x", Value::Int(1))].into_iter().collect();
        let b: Row = [("y", Value::Int(2))].into_iter().collect();
        a.copy_from(&b);
        assert_eq!(a, b);
        assert!(!a.contains("x"));
        assert_eq!(*a.value("y"), Value::Int(2));
    }

    #[test]
    fn overlay_keeps_receiver_only_columns() {
        let mut a: Row = [("x", Value::Int(1)), ("shared", Value::Int(0))]
            .into_iter()
            .collect();
        let b: Row = [("shared", Value::Int(9)), ("y", Value::Int(2))]
            .into_iter()
            .collect();
        a.overlay(&b);
        assert_eq!(*a.value("x"), Value::Int(1));
        assert_eq!(*a.value("shared"), Value::Int(9));
        assert_eq!(*a.value("y"), Value::Int(2));
    }

    #[test]
    fn remove_returns_value() {
        let mut row = Row::new();
        row.set("k", 1);
        assert_eq!(row.remove("K"), Some(Value::Int(1)));
        assert!(row.is_empty());
        assert_eq!(row.remove("k"), None);
    }

    #[test]
    fn create_key_fills_absent_with_null() {
        let mut row = Row::new();
        row.set("id", 9);
        let key = row.create_key(&["id", "region"]);
        assert_eq!(key.parts(), &[Value::Int(9), Value::Null]);
    }
}
