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
//! Tracing subscriber setup.
//!
//! Responsibilities:
//! - One-shot global subscriber installation driven by configuration.
//! - Filter precedence: `$ROWFLOW_LOG` env override, then `log_filter`,
//!   then `log_level`.

use std::sync::{Arc, OnceLock};

use tracing_subscriber::EnvFilter;

use crate::common::config::{self, RowflowConfig};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber from the global configuration.
/// Subsequent calls are no-ops, as is a call racing a subscriber installed
/// by the embedding application.
pub fn init() {
    init_with_config(config::config());
}

/// Install the global tracing subscriber from an explicit configuration.
pub fn init_with_config(cfg: &RowflowConfig) {
    INIT.get_or_init(|| {
        let filter = resolve_filter(cfg);
        match log_file(cfg) {
            Some(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .try_init();
            }
            None => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
        }
    });
}

fn resolve_filter(cfg: &RowflowConfig) -> EnvFilter {
    if let Ok(directive) = std::env::var("ROWFLOW_LOG") {
        if !directive.trim().is_empty() {
            return EnvFilter::new(directive);
        }
    }
    if let Some(filter) = &cfg.log_filter {
        return EnvFilter::new(filter);
    }
    EnvFilter::new(&cfg.log_level)
}

fn log_file(cfg: &RowflowConfig) -> Option<Arc<std::fs::File>> {
    let path = cfg.log_file.as_ref()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(Arc::new(file)),
        Err(err) => {
            eprintln!("rowflow: cannot open log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = RowflowConfig::default();
        init_with_config(&cfg);
        init_with_config(&cfg);
    }
}
