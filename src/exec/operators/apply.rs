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
//! In-place row mutation.

use anyhow::Result;

use crate::exec::operation::{Emit, Operation};
use crate::row::Row;

/// Mutates each row in place and passes it on. Convenient when the
/// transformation only adds or rewrites a few columns.
pub struct ApplyOperation {
    action: Box<dyn FnMut(&mut Row) -> Result<()> + Send>,
}

impl ApplyOperation {
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(&mut Row) -> Result<()> + Send + 'static,
    {
        Self {
            action: Box::new(action),
        }
    }
}

impl Operation for ApplyOperation {
    fn name(&self) -> &str {
        "apply"
    }

    fn on_row(&mut self, mut row: Row) -> Result<Emit> {
        (self.action)(&mut row)?;
        Ok(Emit::Row(row))
    }
}
