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
//! Typed record conversion.
//!
//! Bridges user structs and rows through serde: any `Serialize` struct that
//! serializes to a JSON object becomes a row, one column per field, and any
//! `DeserializeOwned` struct can be rebuilt from a row with matching columns.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::{Error, Result};
use crate::row::{Row, Value};

/// Convert a serializable record into a row, one column per field.
pub fn record_to_row<T: Serialize>(record: &T) -> Result<Row> {
    let json = serde_json::to_value(record).map_err(|e| Error::Record(e.to_string()))?;
    let serde_json::Value::Object(map) = json else {
        return Err(Error::Record(format!(
            "record must serialize to an object, got {}",
            json_kind(&json)
        )));
    };
    let mut row = Row::new();
    for (k, v) in map {
        row.set(k, Value::from(v));
    }
    Ok(row)
}

/// Rebuild a typed record from a row's columns.
pub fn row_to_record<T: DeserializeOwned>(row: &Row) -> Result<T> {
    serde_json::from_value(row.to_json()).map_err(|e| Error::Record(e.to_string()))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
