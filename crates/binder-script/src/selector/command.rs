use async_trait::async_trait;
use binder_core::selector::{
    CommandSelectionContext, ResourceSelector, SelectionError, SelectionResult,
};
use binder_model::Command;
use tracing::{debug, instrument};

use crate::{
    ManagedScript,
    selector::{Decision, base_arguments, selection_error, to_argument},
};

/// Command selector backed by a managed script.
///
/// Script arguments: `jobId`, `jobRequest`, `apiJob`, `commands` (offered commands),
/// `commandClusters` (command id → clusters it runs on).
pub struct CommandScriptSelector {
    name: String,
    script: ManagedScript,
}

impl CommandScriptSelector {
    pub fn new(script: ManagedScript) -> Self {
        Self {
            name: "command-script".into(),
            script,
        }
    }

    pub fn script(&self) -> &ManagedScript {
        &self.script
    }
}

#[async_trait]
impl ResourceSelector for CommandScriptSelector {
    type Context = CommandSelectionContext;
    type Resource = Command;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.script.is_ready_to_evaluate()
    }

    #[instrument(level = "debug", skip_all, fields(job_id = %ctx.job_id, offered = ctx.commands.len()))]
    async fn select(
        &self,
        ctx: &CommandSelectionContext,
    ) -> Result<SelectionResult<Command>, SelectionError> {
        let mut args = base_arguments(&self.name, &ctx.job_id, &ctx.job_request, ctx.api_job)?;
        args.insert("commands".into(), to_argument(&self.name, &ctx.commands)?);
        args.insert(
            "commandClusters".into(),
            to_argument(&self.name, &ctx.command_clusters)?,
        );

        let output = self
            .script
            .evaluate(args)
            .await
            .map_err(|e| selection_error(&self.name, e))?;
        let decision = Decision::parse(&self.name, "id", output)?;
        debug!(choice = ?decision.key, rationale = ?decision.rationale, "command script decided");

        let resource = match decision.key {
            None => None,
            Some(id) => Some(
                ctx.commands
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
