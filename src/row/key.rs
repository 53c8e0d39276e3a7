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
//! Hashable multi-column row keys.
//!
//! Responsibilities:
//! - `RowKey` snapshots the values of selected columns so rows can be bucketed
//!   in hash maps for joins and lookups.
//! - Hashing canonicalizes numeric and boolean representations so any two
//!   keys that compare equal under coercing equality hash identically.

use std::hash::{Hash, Hasher};

use crate::row::Value;

/// An ordered snapshot of key-column values.
#[derive(Clone, Debug)]
pub struct RowKey {
    parts: Vec<Value>,
}

impl RowKey {
    pub fn new(parts: Vec<Value>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Value] {
        &self.parts
    }
}

impl PartialEq for RowKey {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.coerce_eq(b))
    }
}

// Coercing equality never compares NaN equal, so reflexivity holds for every
// key that can participate in a hash lookup.
impl Eq for RowKey {}

impl Hash for RowKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.len().hash(state);
        for part in &self.parts {
            hash_value(part, state);
        }
    }
}

// Tags keep differently typed canonical forms from colliding by accident.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NUM: u8 = 2;
const TAG_STR: u8 = 3;
const TAG_LIST: u8 = 4;
const TAG_ROWS: u8 = 5;

/// Hash one value in its canonical form: numbers (and strings that parse as
/// numbers) by their f64 bits, booleans (and boolean strings) as booleans,
/// everything else structurally. Must stay consistent with
/// [`Value::coerce_eq`].
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => TAG_NULL.hash(state),
        Value::Bool(b) => {
            TAG_BOOL.hash(state);
            b.hash(state);
        }
        Value::Int(i) => hash_number(*i as f64, state),
        Value::Float(f) => hash_number(*f, state),
        Value::Str(s) => {
            let trimmed = s.trim();
            if let Ok(parsed) = trimmed.parse::<f64>() {
                hash_number(parsed, state);
            } else if let Ok(parsed) = trimmed.parse::<bool>() {
                TAG_BOOL.hash(state);
                parsed.hash(state);
            } else {
                TAG_STR.hash(state);
                s.hash(state);
            }
        }
        Value::List(items) => {
            TAG_LIST.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        // Row collections are legal key parts but rare; length is enough to
        // bucket them, equality does the rest.
        Value::Rows(rows) => {
            TAG_ROWS.hash(state);
            rows.len().hash(state);
        }
        Value::Row(row) => {
            TAG_ROWS.hash(state);
            row.len().hash(state);
        }
    }
}

fn hash_number<H: Hasher>(n: f64, state: &mut H) {
    TAG_NUM.hash(state);
    // Normalize the two zero representations to one bit pattern.
    let canonical = if n == 0.0 { 0.0f64 } else { n };
    canonical.to_bits().hash(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &RowKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_keys_hash_equal_across_widths() {
        let a = RowKey::new(vec![Value::Int(7)]);
        let b = RowKey::new(vec![Value::Float(7.0)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn numeric_string_hashes_like_its_number() {
        let a = RowKey::new(vec![Value::from("42")]);
        let b = RowKey::new(vec![Value::Int(42)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn distinct_keys_differ() {
        let a = RowKey::new(vec![Value::from("foo"), Value::Int(1)]);
        let b = RowKey::new(vec![Value::from("foo"), Value::Int(2)]);
        assert_ne!(a, b);
    }

    #[test]
    fn works_as_hash_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(RowKey::new(vec![Value::from("x"), Value::Int(1)]), "hit");
        let probe = RowKey::new(vec![Value::from("x"), Value::Float(1.0)]);
        assert_eq!(map.get(&probe), Some(&"hit"));
    }
}
