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
//! The operation graph and its dispatch engine.
//!
//! Responsibilities:
//! - Owns every operation in an arena; nodes reference each other by `OpId`
//!   only, so the graph can be a DAG with shared sub-chains without shared
//!   ownership of the operations themselves.
//! - Drives rows depth-first: a pushed row is fully processed by the entire
//!   downstream graph before the next row is produced.
//! - Completion gate: a node completes only after all of its observed
//!   upstreams have completed, flushes via `on_completed`, then notifies its
//!   own observers. Completion is idempotent per node.
//! - Errors raised by hooks are wrapped with the failing node's display name
//!   and propagated to downstream observers as notifications.
//!
//! Key exported interfaces:
//! - Types: `OpId`, `PipelineGraph`, `SourceContext`.

use std::sync::Arc;

use crate::common::error::Error;
use crate::exec::operation::{Emit, Operation};
use crate::row::Row;

/// Arena index of one operation in a [`PipelineGraph`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OpId(pub(crate) usize);

struct Node {
    /// Taken out while a hook runs on this node, so dispatch can recurse
    /// through the graph without aliasing the operation.
    op: Option<Box<dyn Operation>>,
    /// User-assigned display name; falls back to the operation's own name.
    name: Option<String>,
    /// Cached at registration; `op` may be checked out when we need it.
    op_name: String,
    rows_seen: u64,
    completed: bool,
    observers: Vec<OpId>,
    observed: Vec<OpId>,
}

/// The arena of operations plus the wiring between them.
#[derive(Default)]
pub struct PipelineGraph {
    nodes: Vec<Node>,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation, returning its id. The node starts unwired.
    pub fn add(&mut self, op: Box<dyn Operation>) -> OpId {
        let op_name = op.name().to_string();
        self.nodes.push(Node {
            op: Some(op),
            name: None,
            op_name,
            rows_seen: 0,
            completed: false,
            observers: Vec::new(),
            observed: Vec::new(),
        });
        OpId(self.nodes.len() - 1)
    }

    /// Wire `observer` to receive rows, completion, and error notifications
    /// from `observed`. Duplicate subscriptions are collapsed.
    pub fn subscribe(&mut self, observed: OpId, observer: OpId) {
        if !self.nodes[observed.0].observers.contains(&observer) {
            self.nodes[observed.0].observers.push(observer);
        }
        if !self.nodes[observer.0].observed.contains(&observed) {
            self.nodes[observer.0].observed.push(observed);
        }
    }

    /// Undo a subscription. Rows already pushed are unaffected.
    pub fn unsubscribe(&mut self, observed: OpId, observer: OpId) {
        self.nodes[observed.0].observers.retain(|&o| o != observer);
        self.nodes[observer.0].observed.retain(|&o| o != observed);
    }

    pub fn set_name(&mut self, id: OpId, name: impl Into<String>) {
        self.nodes[id.0].name = Some(name.into());
    }

    /// The node's display name: the user-assigned name when set, otherwise
    /// the operation kind.
    pub fn display_name(&self, id: OpId) -> &str {
        let node = &self.nodes[id.0];
        node.name.as_deref().unwrap_or(&node.op_name)
    }

    /// Rows this node has received (for sources: produced) so far.
    pub fn rows_seen(&self, id: OpId) -> u64 {
        self.nodes[id.0].rows_seen
    }

    pub fn is_completed(&self, id: OpId) -> bool {
        self.nodes[id.0].completed
    }

    /// Trigger a run rooted at `id`: recursively trigger everything this node
    /// observes; source nodes (nothing observed) produce their rows. Pulling
    /// the trigger on an already-completed source is a no-op, so shared
    /// sub-chains run once no matter how many terminals reach them.
    pub fn trigger(&mut self, id: OpId) {
        let observed = self.nodes[id.0].observed.clone();
        if observed.is_empty() {
            if self.nodes[id.0].completed {
                tracing::debug!(source = %self.display_name(id), "source already completed, skipping");
            } else {
                self.run_source(id);
            }
            return;
        }
        for upstream in observed {
            self.trigger(upstream);
        }
        // Covers nodes wired in after their upstreams completed, e.g. a
        // second terminal on an already-run chain: the gate re-check lets
        // them complete without replaying the sources.
        self.notify_completed(id);
    }

    fn run_source(&mut self, id: OpId) {
        let Some(mut op) = self.nodes[id.0].op.take() else {
            return;
        };
        tracing::debug!(source = %self.display_name(id), "producing");
        let outcome = {
            let mut ctx = SourceContext {
                graph: self,
                source: id,
            };
            op.produce(&mut ctx)
        };
        self.nodes[id.0].op = Some(op);
        if let Err(err) = outcome {
            let wrapped = self.wrap_error(id, err);
            self.propagate_error(id, &wrapped);
        }
        self.nodes[id.0].completed = true;
        for observer in self.nodes[id.0].observers.clone() {
            self.notify_completed(observer);
        }
    }

    /// Push one row into a node, dispatching whatever it emits to its
    /// observers depth-first. Returns the first error raised anywhere in the
    /// downstream graph; the error has already been propagated and captured
    /// by the time this returns, so callers only use it for abort policy.
    pub fn push_row(&mut self, id: OpId, row: Row) -> std::result::Result<(), Arc<Error>> {
        self.nodes[id.0].rows_seen += 1;
        let Some(mut op) = self.nodes[id.0].op.take() else {
            // A node re-entered while its own hook is running means a cycle.
            let err = Arc::new(Error::InvalidPipeline(format!(
                "operation {} re-entered during its own dispatch",
                self.display_name(id)
            )));
            self.propagate_error(id, &err);
            return Err(err);
        };
        let outcome = op.on_row(row);
        self.nodes[id.0].op = Some(op);
        match outcome {
            Ok(Emit::Skip) => Ok(()),
            Ok(Emit::Row(row)) => self.fan_out(id, row),
            Ok(Emit::Rows(rows)) => {
                let mut first_err = None;
                for row in rows {
                    if let Err(err) = self.fan_out(id, row) {
                        first_err.get_or_insert(err);
                    }
                }
                match first_err {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
            Err(err) => {
                let wrapped = self.wrap_error(id, err);
                self.propagate_error(id, &wrapped);
                Err(wrapped)
            }
        }
    }

    /// Push one emitted row to every observer of `id`. All observers see the
    /// row even if one of them errors; the last observer receives the row by
    /// move, the others receive clones.
    fn fan_out(&mut self, id: OpId, row: Row) -> std::result::Result<(), Arc<Error>> {
        let observers = self.nodes[id.0].observers.clone();
        let mut row = Some(row);
        let mut first_err = None;
        let last = observers.len().saturating_sub(1);
        for (i, observer) in observers.into_iter().enumerate() {
            let next = if i == last {
                row.take().expect("row consumed once")
            } else {
                row.as_ref().expect("row available for clone").clone()
            };
            if let Err(err) = self.push_row(observer, next) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Notify every downstream observer of `id` that an error occurred,
    /// recursively, so terminal sinks can record it.
    fn propagate_error(&mut self, id: OpId, error: &Arc<Error>) {
        for observer in self.nodes[id.0].observers.clone() {
            if let Some(mut op) = self.nodes[observer.0].op.take() {
                op.on_error(error);
                self.nodes[observer.0].op = Some(op);
            }
            self.propagate_error(observer, error);
        }
    }

    /// One upstream of `id` has completed. If every upstream has now
    /// completed, flush this node and notify its own observers. Idempotent:
    /// later notifications to a completed node are ignored.
    fn notify_completed(&mut self, id: OpId) {
        if self.nodes[id.0].completed {
            return;
        }
        let all_done = self.nodes[id.0]
            .observed
            .clone()
            .into_iter()
            .all(|upstream| self.nodes[upstream.0].completed);
        if !all_done {
            return;
        }
        let flushed = match self.nodes[id.0].op.take() {
            Some(mut op) => {
                let outcome = op.on_completed();
                self.nodes[id.0].op = Some(op);
                outcome
            }
            None => Ok(Vec::new()),
        };
        tracing::debug!(operation = %self.display_name(id), "completed");
        match flushed {
            Ok(rows) => {
                for row in rows {
                    // Abort policy does not apply to flush rows; errors were
                    // propagated and captured inside fan_out already.
                    let _ = self.fan_out(id, row);
                }
            }
            Err(err) => {
                let wrapped = self.wrap_error(id, err);
                self.propagate_error(id, &wrapped);
            }
        }
        self.nodes[id.0].completed = true;
        for observer in self.nodes[id.0].observers.clone() {
            self.notify_completed(observer);
        }
    }

    fn wrap_error(&self, id: OpId, source: anyhow::Error) -> Arc<Error> {
        Arc::new(Error::RowProcessing {
            operation: self.display_name(id).to_string(),
            source,
        })
    }
}

/// Handed to a source operation's `produce` hook so it can push rows into
/// the graph and raise row-level errors without owning the graph.
pub struct SourceContext<'a> {
    graph: &'a mut PipelineGraph,
    source: OpId,
}

impl SourceContext<'_> {
    /// Push one produced row downstream. The returned error, if any, has
    /// already been captured; a source consults it only to decide whether to
    /// keep producing.
    pub fn push(&mut self, row: Row) -> std::result::Result<(), Arc<Error>> {
        self.graph.nodes[self.source.0].rows_seen += 1;
        self.graph.fan_out(self.source, row)
    }

    /// Raise a row-level error without stopping production, e.g. for one
    /// unparseable input among many.
    pub fn raise(&mut self, error: anyhow::Error) {
        let wrapped = self.graph.wrap_error(self.source, error);
        self.graph.propagate_error(self.source, &wrapped);
    }
}
