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
//! Pass-through row counter.

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::row::Row;

/// Counts rows flowing past and logs the total at completion. Rows pass
/// through untouched.
pub struct LogCountOperation {
    label: String,
    count: u64,
}

impl LogCountOperation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: 0,
        }
    }
}

impl Operation for LogCountOperation {
    fn name(&self) -> &str {
        "log_count"
    }

    fn on_row(&mut self, row: Row) -> Result<Emit> {
        self.count += 1;
        Ok(Emit::Row(row))
    }

    fn on_completed(&mut self) -> Result<Vec<Row>> {
        tracing::info!(label = %self.label, rows = self.count, "stream completed");
        Ok(Vec::new())
    }
}
