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
//! Predicate filter.

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::row::Row;

/// Passes rows the predicate accepts, swallows the rest.
pub struct FilterOperation {
    predicate: Box<dyn FnMut(&Row) -> bool + Send>,
}

impl FilterOperation {
    pub fn new<F>(predicate: F) -> Self
    where
        F: FnMut(&Row) -> bool + Send + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Operation for FilterOperation {
    fn name(&self) -> &str {
        "filter"
    }

    fn on_row(&mut self, row: Row) -> Result<Emit> {
        if (self.predicate)(&row) {
            Ok(Emit::Row(row))
        } else {
            Ok(Emit::Skip)
        }
    }
}
