use std::collections::BTreeMap;

use binder_model::{Cluster, Command, ENV_PREFIX};

use crate::{coordinator::JobSubmission, resolver::Resolution};

/// Environment variables describing the binding of a job.
pub(crate) fn job_environment(
    submission: &JobSubmission,
    resolution: &Resolution,
    cluster: &Cluster,
    command: &Command,
) -> BTreeMap<String, String> {
    let request = &submission.request;
    let mut env = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        env.insert(format!("{ENV_PREFIX}{key}"), value);
    };

    put("JOB_ID", submission.job_id.to_string());
    put("JOB_NAME", request.metadata.name.clone());
    put("USER", request.metadata.user.clone());
    put("CLUSTER_ID", cluster.id.clone());
    put("CLUSTER_NAME", cluster.name.clone());
    put("CLUSTER_TAGS", cluster.tags.to_string());
    put("COMMAND_ID", command.id.clone());
    put("COMMAND_NAME", command.name.clone());
    put("COMMAND_TAGS", command.tags.to_string());
    put(
        "REQUESTED_COMMAND_TAGS",
        request.criteria.command_criterion().tags().to_string(),
    );
    put(
        "REQUESTED_CLUSTER_TAGS",
        resolution.criterion().tags().to_string(),
    );
    for (i, criterion) in request.criteria.cluster_criteria().iter().enumerate() {
        put(
            &format!("REQUESTED_CLUSTER_TAGS_{i}"),
            criterion.tags().to_string(),
        );
    }
    env
}
