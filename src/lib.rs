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
//! rowflow: a push-based, composable row-transformation pipeline engine.
//!
//! A pipeline is a directed acyclic graph of operations built at construction
//! time and driven to completion by triggering its terminal node. Rows are
//! schema-less, ordered, case-insensitive column maps; operations observe
//! upstream operations and push transformed rows to their downstream
//! observers one at a time, depth-first, on a single logical thread of
//! control (optionally one background thread for the whole run).

pub mod common;
pub mod exec;
pub mod row;

pub use common::config::{PipelineConfig, RowflowConfig};
pub use common::error::{Error, Result};
pub use exec::graph::{OpId, PipelineGraph, SourceContext};
pub use exec::operation::{Emit, Operation};
pub use exec::operators::group_by::{GroupRowExt, GROUP_MEMBERS, GROUP_PARENT};
pub use exec::operators::input::InputOperation;
pub use exec::operators::join::{merge_rows, FieldMatcher, JoinSource, JoinType};
pub use exec::pipeline::{JoinFields, OpHandle, Pipeline, Subscription};
pub use exec::result::{FullResult, RunResult};
pub use row::record::{record_to_row, row_to_record};
pub use row::{MissingPolicy, Row, RowKey, Value};
