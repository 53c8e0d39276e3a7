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
//! The source operation.
//!
//! Responsibilities:
//! - Feeds rows from an iterator, a vector, or serializable records into the
//!   graph when triggered.
//! - Abort policy: with `fail_on_error` (the configured default), production
//!   stops at the first downstream error; otherwise errors are captured and
//!   production continues.

use anyhow::Result;
use serde::Serialize;

use crate::common::config;
use crate::exec::graph::SourceContext;
use crate::exec::operation::Operation;
use crate::row::record::record_to_row;
use crate::row::Row;

type RowIter = Box<dyn Iterator<Item = Result<Row>> + Send>;

/// A source that drains an iterator of rows into the graph.
pub struct InputOperation {
    rows: Option<RowIter>,
    fail_on_error: bool,
}

impl InputOperation {
    /// Source over a fixed set of rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::from_iter(rows.into_iter())
    }

    /// Source over an infallible row iterator. The iterator may block, e.g.
    /// a channel receiver feeding a background run.
    pub fn from_iter<I>(rows: I) -> Self
    where
        I: Iterator<Item = Row> + Send + 'static,
    {
        Self::from_fallible(rows.map(Ok))
    }

    /// Source over a fallible iterator, e.g. parsed lines of an input file.
    /// Item errors follow the same abort policy as downstream errors.
    pub fn from_fallible<I>(rows: I) -> Self
    where
        I: Iterator<Item = Result<Row>> + Send + 'static,
    {
        Self {
            rows: Some(Box::new(rows)),
            fail_on_error: config::config().pipeline.fail_on_error,
        }
    }

    /// Source over serializable records, one row per record.
    pub fn from_records<T, I>(records: I) -> Self
    where
        T: Serialize + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let rows = records
            .into_iter()
            .map(|record| record_to_row(&record).map_err(anyhow::Error::from));
        Self {
            rows: Some(Box::new(rows)),
            fail_on_error: config::config().pipeline.fail_on_error,
        }
    }

    /// Override the configured abort policy for this source.
    pub fn fail_on_error(mut self, fail: bool) -> Self {
        self.fail_on_error = fail;
        self
    }
}

impl Operation for InputOperation {
    fn name(&self) -> &str {
        "input"
    }

    fn produce(&mut self, out: &mut SourceContext<'_>) -> Result<()> {
        let Some(rows) = self.rows.take() else {
            return Ok(());
        };
        for item in rows {
            match item {
                Ok(row) => {
                    if out.push(row).is_err() && self.fail_on_error {
                        tracing::warn!("input aborting after downstream error");
                        break;
                    }
                }
                Err(err) => {
                    if self.fail_on_error {
                        return Err(err);
                    }
                    out.raise(err);
                }
            }
        }
        Ok(())
    }
}
