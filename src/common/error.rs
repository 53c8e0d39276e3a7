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
//! Error taxonomy for the pipeline engine.
//!
//! Responsibilities:
//! - Distinguishes row-level processing failures, missing-key lookups, record
//!   conversion failures, aggregate run failures, and pipeline wiring errors.
//! - Row-level errors are captured per run and never abort the graph on their
//!   own; the throwing `execute` driver raises `Error::Aggregate` afterwards.
//!
//! Key exported interfaces:
//! - Types: `Error`, `Result`.

use std::sync::Arc;

use thiserror::Error as ThisError;

use crate::exec::result::FullResult;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the pipeline engine.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A column lookup failed on a row whose policy is to fail on absence.
    #[error("could not find key: {0}")]
    MissingKey(String),

    /// A per-row hook or user callback failed while processing one row.
    /// Captured into the run result and propagated to downstream observers;
    /// whether it aborts the run is the owning source's policy.
    #[error("row processing failed in {operation}: {source}")]
    RowProcessing {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Conversion between a typed record and a row failed.
    #[error("record conversion failed: {0}")]
    Record(String),

    /// One or more row-level errors were captured during a run driven by the
    /// throwing `execute` variant. Carries the full result so callers can
    /// inspect partial success.
    #[error("pipeline run recorded {count} error(s); first: {first}")]
    Aggregate {
        count: usize,
        first: Arc<Error>,
        result: FullResult,
    },

    /// The pipeline graph was wired in a way the engine cannot execute.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
}

impl Error {
    /// The full result attached to an aggregate failure, if any.
    pub fn run_result(&self) -> Option<&FullResult> {
        match self {
            Error::Aggregate { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_message_names_the_key() {
        let err = Error::MissingKey("email".to_string());
        assert_eq!(err.to_string(), "could not find key: email");
    }

    #[test]
    fn row_processing_wraps_the_cause() {
        let err = Error::RowProcessing {
            operation: "transform".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.to_string().contains("transform"));
        assert!(err.to_string().contains("boom"));
    }
}
