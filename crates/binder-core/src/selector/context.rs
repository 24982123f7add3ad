use std::collections::BTreeMap;

use binder_model::{Cluster, Command, JobId, JobRequest};

use crate::launcher::LauncherInfo;

/// Input of a command selector.
#[derive(Clone, Debug)]
pub struct CommandSelectionContext {
    pub job_id: JobId,
    pub job_request: JobRequest,
    /// `true` for API submissions, `false` for detached-agent submissions.
    pub api_job: bool,
    /// Distinct commands of the candidate set.
    pub commands: Vec<Command>,
    /// Command id → clusters it is paired with in the candidate set.
    pub command_clusters: BTreeMap<String, Vec<Cluster>>,
}

/// Input of a cluster selector.
#[derive(Clone, Debug)]
pub struct ClusterSelectionContext {
    pub job_id: JobId,
    pub job_request: JobRequest,
    pub api_job: bool,
    /// Clusters paired with `command` in the candidate set.
    pub clusters: Vec<Cluster>,
    /// Command already chosen for the job.
    pub command: Command,
}

/// Input of an agent-launcher selector.
#[derive(Clone, Debug)]
pub struct LauncherSelectionContext {
    pub job_id: JobId,
    pub job_request: JobRequest,
    pub api_job: bool,
    /// Every registered launcher, in registration order.
    pub launchers: Vec<LauncherInfo>,
    pub cluster: Cluster,
    pub command: Command,
}
