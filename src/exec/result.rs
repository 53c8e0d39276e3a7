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
//! Run results.
//!
//! Responsibilities:
//! - `RunResult` reports the outcome of a run: completion, captured errors,
//!   timing, and a handle to join a background worker.
//! - `FullResult` additionally carries every row that reached the terminal
//!   sink, for drivers that record output.
//!
//! Key exported interfaces:
//! - Types: `RunResult`, `FullResult`.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::common::error::Error;
use crate::row::Row;

/// Mutable state shared between the terminal sink writing a run's outcome
/// and the result handle reading it, possibly across threads.
pub(crate) struct RunState {
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    pub(crate) completed: bool,
    pub(crate) errors: Vec<Arc<Error>>,
    pub(crate) rows: Vec<Row>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            completed: false,
            errors: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Outcome of a pipeline run: completion status, captured row-level errors,
/// and timing. For background runs this doubles as the join handle.
pub struct RunResult {
    state: Arc<Mutex<RunState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RunResult {
    pub(crate) fn new(state: Arc<Mutex<RunState>>) -> Self {
        Self {
            state,
            worker: Mutex::new(None),
        }
    }

    pub(crate) fn with_worker(state: Arc<Mutex<RunState>>, worker: JoinHandle<()>) -> Self {
        Self {
            state,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Whether the run has finished. For a background run this can flip from
    /// false to true; `wait` blocks until it does.
    pub fn is_completed(&self) -> bool {
        self.state.lock().expect("run state lock").completed
    }

    /// Whether the run is still executing on a background thread.
    pub fn in_background(&self) -> bool {
        self.worker
            .lock()
            .expect("worker lock")
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn error_count(&self) -> usize {
        self.state.lock().expect("run state lock").errors.len()
    }

    /// Snapshot of captured row-level errors, in capture order.
    pub fn errors(&self) -> Vec<Arc<Error>> {
        self.state.lock().expect("run state lock").errors.clone()
    }

    /// Wall-clock duration of the run; `None` while still running.
    pub fn duration(&self) -> Option<Duration> {
        let state = self.state.lock().expect("run state lock");
        let finished = state.finished_at?;
        (finished - state.started_at).to_std().ok()
    }

    /// Block until a background run finishes. Synchronous runs are already
    /// finished, so this returns immediately.
    pub fn wait(&self) {
        let handle = self.worker.lock().expect("worker lock").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("pipeline worker thread panicked");
            }
        }
    }
}

impl fmt::Debug for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunResult")
            .field("completed", &self.is_completed())
            .field("errors", &self.error_count())
            .finish()
    }
}

/// A [`RunResult`] that also recorded every row reaching the terminal sink.
pub struct FullResult {
    inner: RunResult,
}

impl FullResult {
    pub(crate) fn new(inner: RunResult) -> Self {
        Self { inner }
    }

    pub fn is_completed(&self) -> bool {
        self.inner.is_completed()
    }

    pub fn in_background(&self) -> bool {
        self.inner.in_background()
    }

    pub fn error_count(&self) -> usize {
        self.inner.error_count()
    }

    pub fn errors(&self) -> Vec<Arc<Error>> {
        self.inner.errors()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.inner.duration()
    }

    pub fn wait(&self) {
        self.inner.wait()
    }

    /// Number of rows that reached the terminal sink.
    pub fn count(&self) -> usize {
        self.inner.state.lock().expect("run state lock").rows.len()
    }

    /// Snapshot of the recorded rows, in arrival order.
    pub fn rows(&self) -> Vec<Row> {
        self.inner.state.lock().expect("run state lock").rows.clone()
    }

    /// Consume the result, taking the recorded rows without cloning.
    pub fn into_rows(self) -> Vec<Row> {
        self.inner.wait();
        std::mem::take(&mut self.inner.state.lock().expect("run state lock").rows)
    }
}

impl fmt::Debug for FullResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullResult")
            .field("completed", &self.is_completed())
            .field("rows", &self.count())
            .field("errors", &self.error_count())
            .finish()
    }
}
