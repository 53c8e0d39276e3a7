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
//! Process-wide configuration.
//!
//! Responsibilities:
//! - Loads TOML configuration from `$ROWFLOW_CONFIG` or `./rowflow.toml`,
//!   falling back to built-in defaults when no file exists.
//! - Supplies logging directives and pipeline behavior defaults.
//!
//! Key exported interfaces:
//! - Types: `RowflowConfig`, `PipelineConfig`.
//! - Functions: `config`, `init_from_path`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

static CONFIG: OnceLock<RowflowConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fail_on_error() -> bool {
    true
}

/// Top-level configuration for the engine.
#[derive(Clone, Debug, Deserialize)]
pub struct RowflowConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "rowflow=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    /// Optional log file path; stderr when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Pipeline behavior defaults.
#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    /// Whether a source aborts production when a row-level error is raised
    /// downstream. Sources may override per instance.
    #[serde(default = "default_fail_on_error")]
    pub fail_on_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fail_on_error: default_fail_on_error(),
        }
    }
}

impl Default for RowflowConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            log_file: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RowflowConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: RowflowConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }
}

/// Initialize the global configuration from an explicit path.
/// A no-op returning the existing value if already initialized.
pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static RowflowConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = RowflowConfig::load_from_file(path.as_ref())?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

/// The global configuration, loading it on first access.
///
/// Resolution order: `$ROWFLOW_CONFIG`, then `./rowflow.toml`, then built-in
/// defaults. A file that exists but fails to load falls back to defaults with
/// a warning rather than poisoning every later pipeline run.
pub fn config() -> &'static RowflowConfig {
    CONFIG.get_or_init(|| match resolve_config_path() {
        Some(path) => RowflowConfig::load_from_file(&path).unwrap_or_else(|err| {
            tracing::warn!("failed to load config {}: {err:#}", path.display());
            RowflowConfig::default()
        }),
        None => RowflowConfig::default(),
    })
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ROWFLOW_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }
    let default = PathBuf::from("rowflow.toml");
    default.exists().then_some(default)
}
