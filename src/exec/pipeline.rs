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
//! The fluent construction layer and run drivers.
//!
//! Responsibilities:
//! - `Pipeline` owns one shared graph; `OpHandle` is a cheap, cloneable
//!   reference to one node used to chain further operations onto it.
//! - Drivers append a terminal sink and trigger the graph: `start` runs for
//!   side effects, `record` additionally captures output rows, `execute` is
//!   the throwing variant, and the `_in_thread` forms run on a background
//!   thread with the result doubling as the join handle.
//!
//! Key exported interfaces:
//! - Types: `Pipeline`, `OpHandle`, `Subscription`, `JoinFields`.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::common::error::{Error, Result};
use crate::exec::graph::{OpId, PipelineGraph};
use crate::exec::operation::Operation;
use crate::exec::operators::apply::ApplyOperation;
use crate::exec::operators::dispatch_group::DispatchGroupOperation;
use crate::exec::operators::filter::FilterOperation;
use crate::exec::operators::group_by::GroupByOperation;
use crate::exec::operators::input::InputOperation;
use crate::exec::operators::join::{
    merge_rows, FieldMatcher, JoinOperation, JoinSource, JoinType,
};
use crate::exec::operators::log_count::LogCountOperation;
use crate::exec::operators::record::TerminalOperation;
use crate::exec::operators::transform::TransformOperation;
use crate::exec::operators::union::UnionOperation;
use crate::exec::result::{FullResult, RunResult, RunState};
use crate::row::Row;

/// A pipeline under construction: one shared operation graph.
#[derive(Clone, Default)]
pub struct Pipeline {
    graph: Arc<Mutex<PipelineGraph>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source (or any standalone operation) in this pipeline.
    pub fn source(&self, op: impl Operation + 'static) -> OpHandle {
        let id = self
            .graph
            .lock()
            .expect("pipeline graph lock")
            .add(Box::new(op));
        OpHandle {
            graph: Arc::clone(&self.graph),
            id,
        }
    }

    /// A source over fixed rows.
    pub fn rows(&self, rows: Vec<Row>) -> OpHandle {
        self.source(InputOperation::from_rows(rows))
    }

    /// A source over a row iterator; the iterator may block, e.g. a channel
    /// receiver feeding a background run.
    pub fn iter<I>(&self, rows: I) -> OpHandle
    where
        I: Iterator<Item = Row> + Send + 'static,
    {
        self.source(InputOperation::from_iter(rows))
    }

    /// A source over serializable records.
    pub fn records<T, I>(&self, records: I) -> OpHandle
    where
        T: Serialize + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        self.source(InputOperation::from_records(records))
    }

    /// One-liner for the common single-chain case.
    pub fn from_rows(rows: Vec<Row>) -> OpHandle {
        Pipeline::new().rows(rows)
    }

    pub fn from_iter<I>(rows: I) -> OpHandle
    where
        I: Iterator<Item = Row> + Send + 'static,
    {
        Pipeline::new().iter(rows)
    }

    pub fn from_records<T, I>(records: I) -> OpHandle
    where
        T: Serialize + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Pipeline::new().records(records)
    }
}

/// The two key field names of a standard join, convertible from a single
/// name (same column on both sides) or a `(left, right)` pair.
#[derive(Clone, Debug)]
pub struct JoinFields {
    pub left: String,
    pub right: String,
}

impl From<&str> for JoinFields {
    fn from(field: &str) -> Self {
        Self {
            left: field.to_string(),
            right: field.to_string(),
        }
    }
}

impl From<String> for JoinFields {
    fn from(field: String) -> Self {
        Self {
            left: field.clone(),
            right: field,
        }
    }
}

impl From<(&str, &str)> for JoinFields {
    fn from((left, right): (&str, &str)) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl From<(String, String)> for JoinFields {
    fn from((left, right): (String, String)) -> Self {
        Self { left, right }
    }
}

/// A reference to one node of a pipeline graph. Cloning the handle does not
/// clone the node; all clones address the same operation.
#[derive(Clone)]
pub struct OpHandle {
    graph: Arc<Mutex<PipelineGraph>>,
    id: OpId,
}

impl OpHandle {
    /// Wire a new operation downstream of this node and return its handle.
    pub fn attach(&self, op: impl Operation + 'static) -> OpHandle {
        let mut graph = self.graph.lock().expect("pipeline graph lock");
        let id = graph.add(Box::new(op));
        graph.subscribe(self.id, id);
        OpHandle {
            graph: Arc::clone(&self.graph),
            id,
        }
    }

    /// Assign a display name used in logs and error messages.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .set_name(self.id, name);
        self
    }

    // ---- chaining ----

    /// One row in, one row out.
    pub fn transform<F>(&self, f: F) -> OpHandle
    where
        F: FnMut(Row) -> anyhow::Result<Row> + Send + 'static,
    {
        self.attach(TransformOperation::new(f))
    }

    /// One row in, any number of rows out.
    pub fn transform_many<F>(&self, f: F) -> OpHandle
    where
        F: FnMut(Row) -> anyhow::Result<Vec<Row>> + Send + 'static,
    {
        self.attach(TransformOperation::new_many(f))
    }

    /// Keep rows the predicate accepts.
    pub fn filter<F>(&self, predicate: F) -> OpHandle
    where
        F: FnMut(&Row) -> bool + Send + 'static,
    {
        self.attach(FilterOperation::new(predicate))
    }

    /// Mutate each row in place.
    pub fn apply<F>(&self, action: F) -> OpHandle
    where
        F: FnMut(&mut Row) -> anyhow::Result<()> + Send + 'static,
    {
        self.attach(ApplyOperation::new(action))
    }

    /// Count rows flowing past, logging the total at completion.
    pub fn log_count(&self, label: impl Into<String>) -> OpHandle {
        self.attach(LogCountOperation::new(label))
    }

    /// Bucket the stream by key columns; one group row per bucket flows out
    /// at completion.
    pub fn group_by<I, S>(&self, columns: I) -> OpHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attach(GroupByOperation::new(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    /// Group-by with an aggregate fold applied per arriving member.
    pub fn group_by_aggregate<I, S, F>(&self, columns: I, aggregate: F) -> OpHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&mut Row, &Row) -> anyhow::Result<()> + Send + 'static,
    {
        self.attach(
            GroupByOperation::new(columns.into_iter().map(Into::into).collect())
                .with_aggregate(aggregate),
        )
    }

    /// Unpack group rows back into parent-stamped member rows.
    pub fn dispatch_group(&self) -> OpHandle {
        self.attach(DispatchGroupOperation)
    }

    /// Merge this stream with another stream of the same pipeline. The
    /// merged stream completes only after both inputs have.
    ///
    /// # Panics
    /// Panics if `other` belongs to a different pipeline.
    pub fn union(&self, other: &OpHandle) -> OpHandle {
        assert!(
            Arc::ptr_eq(&self.graph, &other.graph),
            "union requires operations of the same pipeline"
        );
        let mut graph = self.graph.lock().expect("pipeline graph lock");
        let id = graph.add(Box::new(UnionOperation));
        graph.subscribe(self.id, id);
        graph.subscribe(other.id, id);
        OpHandle {
            graph: Arc::clone(&self.graph),
            id,
        }
    }

    /// Explicitly wire this node to an existing downstream node, returning a
    /// subscription that can undo the wiring.
    ///
    /// # Panics
    /// Panics if `downstream` belongs to a different pipeline.
    pub fn subscribe(&self, downstream: &OpHandle) -> Subscription {
        assert!(
            Arc::ptr_eq(&self.graph, &downstream.graph),
            "subscribe requires operations of the same pipeline"
        );
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .subscribe(self.id, downstream.id);
        Subscription {
            graph: Arc::clone(&self.graph),
            upstream: self.id,
            downstream: downstream.id,
        }
    }

    // ---- joins ----

    /// Join this stream against a right side with arbitrary match and merge
    /// closures. `matcher` is also consulted with `None` to decide whether an
    /// unmatched left row is preserved.
    ///
    /// # Panics
    /// Panics if the right side is a node of this same pipeline; a right-side
    /// pipeline must be separate because it is drained to completion on
    /// first use.
    pub fn join<M, G>(&self, right: impl Into<JoinSource>, matcher: M, merge: G) -> OpHandle
    where
        M: FnMut(&Row, Option<&Row>) -> bool + Send + 'static,
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        let right = right.into();
        if let JoinSource::Operation(handle) = &right {
            assert!(
                !Arc::ptr_eq(&self.graph, &handle.graph),
                "join right side must come from a separate pipeline"
            );
        }
        self.attach(JoinOperation::new(right, matcher, merge))
    }

    fn field_join<G>(
        &self,
        join_type: JoinType,
        right: impl Into<JoinSource>,
        fields: JoinFields,
        merge: G,
    ) -> OpHandle
    where
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        let matcher = FieldMatcher::new(join_type, fields.left, fields.right);
        self.join(right, move |l, r| matcher.matches(l, r), merge)
    }

    /// Inner join on one field per side with the default column merge.
    pub fn inner_join(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
    ) -> OpHandle {
        self.field_join(JoinType::Inner, right, fields.into(), |l, r| {
            Ok(merge_rows(l, r))
        })
    }

    pub fn inner_join_with<G>(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
        merge: G,
    ) -> OpHandle
    where
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        self.field_join(JoinType::Inner, right, fields.into(), merge)
    }

    /// Left outer join: unmatched left rows are preserved, merged with no
    /// right side.
    pub fn left_join(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
    ) -> OpHandle {
        self.field_join(JoinType::Left, right, fields.into(), |l, r| {
            Ok(merge_rows(l, r))
        })
    }

    pub fn left_join_with<G>(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
        merge: G,
    ) -> OpHandle
    where
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        self.field_join(JoinType::Left, right, fields.into(), merge)
    }

    /// Right outer join: unmatched right rows flow out at completion.
    pub fn right_join(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
    ) -> OpHandle {
        self.field_join(JoinType::Right, right, fields.into(), |l, r| {
            Ok(merge_rows(l, r))
        })
    }

    pub fn right_join_with<G>(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
        merge: G,
    ) -> OpHandle
    where
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        self.field_join(JoinType::Right, right, fields.into(), merge)
    }

    /// Full outer join: both unmatched sides are preserved.
    pub fn full_join(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
    ) -> OpHandle {
        self.field_join(JoinType::Full, right, fields.into(), |l, r| {
            Ok(merge_rows(l, r))
        })
    }

    pub fn full_join_with<G>(
        &self,
        right: impl Into<JoinSource>,
        fields: impl Into<JoinFields>,
        merge: G,
    ) -> OpHandle
    where
        G: FnMut(&Row, Option<&Row>) -> anyhow::Result<Row> + Send + 'static,
    {
        self.field_join(JoinType::Full, right, fields.into(), merge)
    }

    // ---- drivers ----

    /// Run the pipeline to completion for its side effects.
    pub fn start(&self) -> RunResult {
        let (state, terminal) = self.prepare_terminal(false);
        self.drive(terminal);
        RunResult::new(state)
    }

    /// Run on a background thread; the returned result doubles as the join
    /// handle.
    pub fn start_in_thread(&self) -> RunResult {
        let (state, terminal) = self.prepare_terminal(false);
        let worker = self.drive_in_thread(terminal);
        RunResult::with_worker(state, worker)
    }

    /// Run to completion, recording every row that reaches this node.
    pub fn record(&self) -> FullResult {
        let (state, terminal) = self.prepare_terminal(true);
        self.drive(terminal);
        FullResult::new(RunResult::new(state))
    }

    /// Like [`record`](Self::record), but any captured row-level error turns
    /// the whole run into `Error::Aggregate`, carrying the partial result.
    pub fn execute(&self) -> Result<FullResult> {
        let result = self.record();
        let errors = result.errors();
        match errors.first() {
            None => Ok(result),
            Some(first) => Err(Error::Aggregate {
                count: errors.len(),
                first: Arc::clone(first),
                result,
            }),
        }
    }

    /// Like [`execute`](Self::execute), but captured errors stay inside the
    /// result instead of failing the call.
    pub fn execute_tolerant(&self) -> FullResult {
        self.record()
    }

    /// Record on a background thread.
    pub fn execute_in_thread(&self) -> FullResult {
        let (state, terminal) = self.prepare_terminal(true);
        let worker = self.drive_in_thread(terminal);
        FullResult::new(RunResult::with_worker(state, worker))
    }

    fn prepare_terminal(&self, capture_rows: bool) -> (Arc<Mutex<RunState>>, OpId) {
        let state = Arc::new(Mutex::new(RunState::new()));
        let mut graph = self.graph.lock().expect("pipeline graph lock");
        let terminal = graph.add(Box::new(TerminalOperation::new(
            Arc::clone(&state),
            capture_rows,
        )));
        graph.subscribe(self.id, terminal);
        (state, terminal)
    }

    fn drive(&self, terminal: OpId) {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .trigger(terminal);
    }

    fn drive_in_thread(&self, terminal: OpId) -> std::thread::JoinHandle<()> {
        let graph = Arc::clone(&self.graph);
        std::thread::Builder::new()
            .name("rowflow-worker".to_string())
            .spawn(move || {
                graph.lock().expect("pipeline graph lock").trigger(terminal);
            })
            .expect("spawn pipeline worker")
    }

    // ---- inspection ----

    /// Rows this node has received (for sources: produced) so far.
    pub fn rows_seen(&self) -> u64 {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .rows_seen(self.id)
    }

    pub fn display_name(&self) -> String {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .display_name(self.id)
            .to_string()
    }

    pub fn is_completed(&self) -> bool {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .is_completed(self.id)
    }
}

/// An undoable wiring between two nodes of one pipeline.
pub struct Subscription {
    graph: Arc<Mutex<PipelineGraph>>,
    upstream: OpId,
    downstream: OpId,
}

impl Subscription {
    /// Remove the wiring. Rows already pushed are unaffected.
    pub fn unsubscribe(self) {
        self.graph
            .lock()
            .expect("pipeline graph lock")
            .unsubscribe(self.upstream, self.downstream);
    }
}
