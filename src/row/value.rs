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
//! Dynamically typed cell values.
//!
//! Responsibilities:
//! - `Value` is the cell type stored in rows: null, scalars, lists, nested
//!   rows, and grouped row collections.
//! - Equality is coercing: numeric widths compare by value, and numeric or
//!   boolean strings compare equal to their parsed counterparts. Join and
//!   group-by key comparison build on this.
//!
//! Key exported interfaces:
//! - Types: `Value`.

use std::fmt;
use std::sync::Arc;

use crate::row::Row;

/// Shared null used for lenient lookups on rows, so `Row::value` can hand out
/// a reference without materializing anything.
pub(crate) static NULL: Value = Value::Null;

/// A single cell value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A homogeneous or heterogeneous list of values.
    List(Vec<Value>),
    /// Rows collected under a group, stored inline in the group row.
    Rows(Vec<Row>),
    /// A shared reference to another row, used to stamp dispatched group
    /// members with their parent group row.
    Row(Arc<Row>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view over both integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            Value::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Rows(_) => "rows",
            Value::Row(_) => "row",
        }
    }

    /// Coercing equality. Numeric variants compare by value across widths,
    /// and strings that parse as numbers or booleans compare equal to the
    /// parsed value. Everything else requires matching variants.
    pub fn coerce_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
            (Str(a), Str(b)) => a == b,
            (n @ (Int(_) | Float(_)), Str(s)) | (Str(s), n @ (Int(_) | Float(_))) => s
                .trim()
                .parse::<f64>()
                .is_ok_and(|parsed| n.as_f64() == Some(parsed)),
            (Bool(b), Str(s)) | (Str(s), Bool(b)) => {
                s.trim().parse::<bool>().is_ok_and(|parsed| parsed == *b)
            }
            (List(a), List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.coerce_eq(y))
            }
            (Rows(a), Rows(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y),
            (Row(a), Row(b)) => a.as_ref() == b.as_ref(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.coerce_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Rows(rows) => write!(f, "<{} rows>", rows.len()),
            Value::Row(_) => write!(f, "<row>"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut row = Row::new();
                for (k, v) in map {
                    row.set(k, Value::from(v));
                }
                Value::Row(Arc::new(row))
            }
        }
    }
}

impl Value {
    /// JSON projection, used for typed record extraction.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Rows(rows) => serde_json::Value::Array(rows.iter().map(Row::to_json).collect()),
            Value::Row(row) => row.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widths_compare_equal() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_ne!(Value::Int(3), Value::Float(3.5));
    }

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(Value::Int(42), Value::from("42"));
        assert_eq!(Value::Float(1.5), Value::from(" 1.5 "));
        assert_ne!(Value::Int(42), Value::from("42x"));
    }

    #[test]
    fn bool_strings_coerce() {
        assert_eq!(Value::Bool(true), Value::from("true"));
        assert_ne!(Value::Bool(true), Value::from("yes"));
    }

    #[test]
    fn null_only_equals_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::from(""));
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn json_round_trip_preserves_scalars() {
        let v = Value::from(serde_json::json!({"a": 1, "b": "x", "c": [true, null]}));
        let Value::Row(row) = &v else {
            panic!("expected row value");
        };
        assert_eq!(*row.value("a"), Value::Int(1));
        assert_eq!(*row.value("b"), Value::from("x"));
        assert_eq!(
            *row.value("c"),
            Value::List(vec![Value::Bool(true), Value::Null])
        );
    }
}
