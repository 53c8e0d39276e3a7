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
//! The operation contract.
//!
//! Responsibilities:
//! - `Operation` is the single trait every node in a pipeline graph
//!   implements. The graph drives the hooks; operations never talk to each
//!   other directly.
//! - `Emit` is the per-row verdict: pass one row on, fan out several, or
//!   swallow the row.
//!
//! Key exported interfaces:
//! - Types: `Emit`.
//! - Traits: `Operation`.

use std::sync::Arc;

use crate::common::error::Error;
use crate::exec::graph::SourceContext;
use crate::row::Row;

/// What an operation emits downstream in response to one input row.
#[derive(Debug)]
pub enum Emit {
    /// Push one row to every observer.
    Row(Row),
    /// Push several rows, in order, to every observer.
    Rows(Vec<Row>),
    /// Push nothing for this input.
    Skip,
}

/// A node in the pipeline graph.
///
/// All hooks default to pass-through behavior, so an operation only overrides
/// what it needs: sources override `produce`, row transforms override
/// `on_row`, buffering operations additionally override `on_completed` to
/// flush.
pub trait Operation: Send {
    /// Stable name used in logs and error messages, typically the operation
    /// kind. A per-node display name can be set on the graph separately.
    fn name(&self) -> &str;

    /// Handle one row pushed from upstream. Errors are captured by the run,
    /// propagated to downstream observers as notifications, and do not by
    /// themselves stop the graph.
    fn on_row(&mut self, row: Row) -> anyhow::Result<Emit> {
        Ok(Emit::Row(row))
    }

    /// Called exactly once, after every upstream source this operation
    /// observes has completed. Returned rows are pushed downstream before the
    /// completion notification travels on.
    fn on_completed(&mut self) -> anyhow::Result<Vec<Row>> {
        Ok(Vec::new())
    }

    /// Observe an error raised upstream. Purely informational; most
    /// operations ignore it and only terminal sinks record it.
    fn on_error(&mut self, _error: &Arc<Error>) {}

    /// Produce rows into the graph. Only source operations (nodes with no
    /// upstream) implement this; it runs when the node is triggered.
    fn produce(&mut self, _out: &mut SourceContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}
