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
//! One-to-one and one-to-many row transforms over user closures.

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::row::Row;

type OneFn = Box<dyn FnMut(Row) -> Result<Row> + Send>;
type ManyFn = Box<dyn FnMut(Row) -> Result<Vec<Row>> + Send>;

enum Transform {
    One(OneFn),
    Many(ManyFn),
}

/// Applies a user closure to every row.
pub struct TransformOperation {
    transform: Transform,
}

impl TransformOperation {
    /// One row in, one row out.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(Row) -> Result<Row> + Send + 'static,
    {
        Self {
            transform: Transform::One(Box::new(f)),
        }
    }

    /// One row in, any number of rows out. An empty vector swallows the row.
    pub fn new_many<F>(f: F) -> Self
    where
        F: FnMut(Row) -> Result<Vec<Row>> + Send + 'static,
    {
        Self {
            transform: Transform::Many(Box::new(f)),
        }
    }
}

impl Operation for TransformOperation {
    fn name(&self) -> &str {
        "transform"
    }

    fn on_row(&mut self, row: Row) -> Result<Emit> {
        match &mut self.transform {
            Transform::One(f) => Ok(Emit::Row(f(row)?)),
            Transform::Many(f) => Ok(Emit::Rows(f(row)?)),
        }
    }
}
