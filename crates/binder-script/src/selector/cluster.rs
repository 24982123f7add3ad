use async_trait::async_trait;
use binder_core::selector::{
    ClusterSelectionContext, ResourceSelector, SelectionError, SelectionResult,
};
use binder_model::Cluster;
use tracing::{debug, instrument};

use crate::{
    ManagedScript,
    selector::{Decision, base_arguments, selection_error, to_argument},
};

/// Cluster selector backed by a managed script.
///
/// Script arguments: `jobId`, `jobRequest`, `apiJob`, `clusters` (offered clusters),
/// `command` (the command already chosen).
pub struct ClusterScriptSelector {
    name: String,
    script: ManagedScript,
}

impl ClusterScriptSelector {
    pub fn new(script: ManagedScript) -> Self {
        Self {
            name: "cluster-script".into(),
            script,
        }
    }

    pub fn script(&self) -> &ManagedScript {
        &self.script
    }
}

#[async_trait]
impl ResourceSelector for ClusterScriptSelector {
    type Context = ClusterSelectionContext;
    type Resource = Cluster;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.script.is_ready_to_evaluate()
    }

    #[instrument(level = "debug", skip_all, fields(job_id = %ctx.job_id, offered = ctx.clusters.len()))]
    async fn select(
        &self,
        ctx: &ClusterSelectionContext,
    ) -> Result<SelectionResult<Cluster>, SelectionError> {
        let mut args = base_arguments(&self.name, &ctx.job_id, &ctx.job_request, ctx.api_job)?;
        args.insert("clusters".into(), to_argument(&self.name, &ctx.clusters)?);
        args.insert("command".into(), to_argument(&self.name, &ctx.command)?);

        let output = self
            .script
            .evaluate(args)
            .await
            .map_err(|e| selection_error(&self.name, e))?;
        let decision = Decision::parse(&self.name, "id", output)?;
        debug!(choice = ?decision.key, rationale = ?decision.rationale, "cluster script decided");

        let resource = match decision.key {
            None => None,
            Some(id) => Some(
                ctx.clusters
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .ok_or_else(|| SelectionError::OutOfSet {
                        selector: self.name.clone(),
                        resource: id,
                    })?,
            ),
        };
        Ok(SelectionResult::new(resource, decision.rationale))
    }
}
