use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use binder_core::catalog::InMemoryCatalog;
use binder_model::Labels;
use binder_observe::LoggerConfig;
use binder_script::ScriptProperties;

/// Daemon configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaemonConfig {
    pub logger: LoggerConfig,
    /// Catalog snapshot served for the whole run.
    pub catalog: InMemoryCatalog,
    pub launchers: Vec<LauncherConfig>,
    pub scripts: ScriptsConfig,
    /// Jobs are kept raw so that one malformed entry fails alone.
    pub jobs: Vec<serde_json::Value>,
    /// Maximum number of jobs resolved at the same time.
    pub concurrency: Option<usize>,
    /// Collect prometheus metrics and print them after the run.
    pub metrics: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptsConfig {
    pub command: ScriptProperties,
    pub cluster: ScriptProperties,
    pub launcher: ScriptProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    /// Static properties merged into the launcher extension payload.
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

/// One entry of `jobs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEntry {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default = "default_api_job")]
    pub api_job: bool,
    pub request: serde_json::Value,
}

fn default_api_job() -> bool {
    true
}

impl DaemonConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(4).max(1)
    }
}
