use async_trait::async_trait;
use binder_core::{
    launcher::LauncherInfo,
    selector::{LauncherSelectionContext, ResourceSelector, SelectionError, SelectionResult},
};
use tracing::{debug, instrument};

use crate::{
    ManagedScript,
    selector::{Decision, base_arguments, selection_error, to_argument},
};

/// Agent-launcher selector backed by a managed script.
///
/// Script arguments: `jobId`, `jobRequest`, `apiJob`, `launchers` (every registered
/// launcher with its labels), `cluster`, `command`. Launchers are referenced by name.
pub struct LauncherScriptSelector {
    name: String,
    script: ManagedScript,
}

impl LauncherScriptSelector {
    pub fn new(script: ManagedScript) -> Self {
        Self {
            name: "launcher-script".into(),
            script,
        }
    }

    pub fn script(&self) -> &ManagedScript {
        &self.script
    }
}

#[async_trait]
impl ResourceSelector for LauncherScriptSelector {
    type Context = LauncherSelectionContext;
    type Resource = LauncherInfo;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.script.is_ready_to_evaluate()
    }

    #[instrument(level = "debug", skip_all, fields(job_id = %ctx.job_id, offered = ctx.launchers.len()))]
    async fn select(
        &self,
        ctx: &LauncherSelectionContext,
    ) -> Result<SelectionResult<LauncherInfo>, SelectionError> {
        let mut args = base_arguments(&self.name, &ctx.job_id, &ctx.job_request, ctx.api_job)?;
        args.insert("launchers".into(), to_argument(&self.name, &ctx.launchers)?);
        args.insert("cluster".into(), to_argument(&self.name, &ctx.cluster)?);
        args.insert("command".into(), to_argument(&self.name, &ctx.command)?);

        let output = self
            .script
            .evaluate(args)
            .await
            .map_err(|e| selection_error(&self.name, e))?;
        let decision = Decision::parse(&self.name, "name", output)?;
        debug!(choice = ?decision.key, rationale = ?decision.rationale, "launcher script decided");

        let resource = match decision.key {
            None => None,
            Some(name) => Some(
                ctx.launchers
                    .iter()
                    .find(|l| l.name == name)
                    .cloned()
                    .ok_or_else(|| SelectionError::OutOfSet {
                        selector: self.name.clone(),
                        resource: name,
                    })?,
            ),
        };
        Ok(SelectionResult::new(resource, decision.rationale))
    }
}
