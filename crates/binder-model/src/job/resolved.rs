use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Application, Cluster, Command, JobId};

/// Agent launcher chosen for a job, with its opaque extension payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LauncherBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<serde_json::Value>,
}

/// Final, immutable binding of a job to concrete execution resources.
///
/// Produced only by a successful resolution; there is no partially resolved job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResolvedJob {
    job_id: JobId,
    cluster: Cluster,
    command: Command,
    applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    launcher: Option<LauncherBinding>,
    #[serde(default)]
    environment: BTreeMap<String, String>,
}

impl ResolvedJob {
    pub fn new(
        job_id: JobId,
        cluster: Cluster,
        command: Command,
        applications: Vec<Application>,
        launcher: Option<LauncherBinding>,
        environment: BTreeMap<String, String>,
    ) -> Self {
        Self {
            job_id,
            cluster,
            command,
            applications,
            launcher,
            environment,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn launcher(&self) -> Option<&LauncherBinding> {
        self.launcher.as_ref()
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster.id
    }

    pub fn command_id(&self) -> &str {
        &self.command.id
    }

    /// Application ids in load order.
    pub fn application_ids(&self) -> Vec<&str> {
        self.applications.iter().map(|a| a.id.as_str()).collect()
    }
}
