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
//! Terminal sink writing a run's outcome into shared run state.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::common::error::Error;
use crate::exec::operation::{Emit, Operation};
use crate::exec::result::RunState;
use crate::row::Row;

/// The node drivers append to a pipeline before triggering it. Records
/// captured errors and, when asked, every arriving row; marks the run
/// finished when the completion gate reaches it.
pub struct TerminalOperation {
    state: Arc<Mutex<RunState>>,
    capture_rows: bool,
}

impl TerminalOperation {
    pub(crate) fn new(state: Arc<Mutex<RunState>>, capture_rows: bool) -> Self {
        Self {
            state,
            capture_rows,
        }
    }
}

impl Operation for TerminalOperation {
    fn name(&self) -> &str {
        "terminal"
    }

    fn on_row(&mut self, row: Row) -> Result<Emit> {
        if self.capture_rows {
            self.state.lock().expect("run state lock").rows.push(row);
        }
        Ok(Emit::Skip)
    }

    fn on_error(&mut self, error: &Arc<Error>) {
        self.state
            .lock()
            .expect("run state lock")
            .errors
            .push(Arc::clone(error));
    }

    fn on_completed(&mut self) -> Result<Vec<Row>> {
        let mut state = self.state.lock().expect("run state lock");
        state.finished_at = Some(chrono::Utc::now());
        state.completed = true;
        tracing::debug!(
            rows = state.rows.len(),
            errors = state.errors.len(),
            "run finished"
        );
        Ok(Vec::new())
    }
}
