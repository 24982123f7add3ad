//! Selection coordinator: deterministic resolver → optional selector overrides → resolved job.
//!
//! Per job:
//! 1. run the deterministic resolver (fail fast when nothing matches);
//! 2. let the command selector pick among the candidate commands;
//! 3. let the cluster selector pick among the clusters paired with that command;
//! 4. resolve applications (requested ids, else the command's own);
//! 5. pick an agent launcher (selector, else registry routing);
//! 6. assemble the immutable [`ResolvedJob`].
//!
//! A selector that is absent, not ready, not configured or abstaining defers to the
//! deterministic choice. Any other selector failure aborts the resolution.
mod env;

mod error;
pub use error::{ResolutionError, ResolutionStage};

use std::{sync::Arc, time::Instant};

use binder_model::{
    Application, Cluster, Command, ExecutionResourceCriteria, JobId, JobRequest,
    LauncherBinding, ResolvedJob,
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::{
    catalog::Catalog,
    launcher::{LauncherInfo, LauncherRegistry},
    metrics::{MetricsHandle, ResolutionOutcome, SelectionOutcome, noop_metrics},
    resolver::resolve,
    selector::{
        ClusterSelectionContext, CommandSelectionContext, LauncherSelectionContext,
        ResourceSelector, SelectionError,
    },
};

pub type CommandSelectorRef =
    Arc<dyn ResourceSelector<Context = CommandSelectionContext, Resource = Command>>;
pub type ClusterSelectorRef =
    Arc<dyn ResourceSelector<Context = ClusterSelectionContext, Resource = Cluster>>;
pub type LauncherSelectorRef =
    Arc<dyn ResourceSelector<Context = LauncherSelectionContext, Resource = LauncherInfo>>;

/// A job request together with its submission metadata.
#[derive(Clone, Debug)]
pub struct JobSubmission {
    pub job_id: JobId,
    pub request: JobRequest,
    /// `true` for API submissions, `false` for detached-agent submissions.
    pub api_job: bool,
}

impl JobSubmission {
    /// New API submission with a freshly generated id.
    pub fn new(request: JobRequest) -> Self {
        Self {
            job_id: JobId::generate(),
            request,
            api_job: true,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// Mark as a detached-agent submission.
    pub fn detached(mut self) -> Self {
        self.api_job = false;
        self
    }
}

/// Selector decision, tagged with the selector that made it.
struct Choice<R> {
    selector: String,
    resource: R,
}

impl<R> Choice<R> {
    fn out_of_set(&self, id: &str) -> ResolutionError {
        ResolutionError::Script(SelectionError::OutOfSet {
            selector: self.selector.clone(),
            resource: id.to_string(),
        })
    }
}

pub struct Coordinator {
    catalog: Arc<dyn Catalog>,
    launchers: LauncherRegistry,
    command_selector: Option<CommandSelectorRef>,
    cluster_selector: Option<ClusterSelectorRef>,
    launcher_selector: Option<LauncherSelectorRef>,
    metrics: MetricsHandle,
}

impl Coordinator {
    /// Coordinator with no selectors, no launchers and no-op metrics.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            launchers: LauncherRegistry::new(),
            command_selector: None,
            cluster_selector: None,
            launcher_selector: None,
            metrics: noop_metrics(),
        }
    }

    pub fn with_launchers(mut self, launchers: LauncherRegistry) -> Self {
        self.launchers = launchers;
        self
    }

    pub fn with_command_selector(mut self, selector: CommandSelectorRef) -> Self {
        self.command_selector = Some(selector);
        self
    }

    pub fn with_cluster_selector(mut self, selector: ClusterSelectorRef) -> Self {
        self.cluster_selector = Some(selector);
        self
    }

    pub fn with_launcher_selector(mut self, selector: LauncherSelectorRef) -> Self {
        self.launcher_selector = Some(selector);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Resolve one job.
    #[instrument(
        level = "debug",
        skip(self, submission),
        fields(job_id = %submission.job_id, job = %submission.request.metadata.name)
    )]
    pub async fn resolve(&self, submission: &JobSubmission) -> Result<ResolvedJob, ResolutionError> {
        let started = Instant::now();
        let result = self.resolve_inner(submission).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(job) => {
                self.metrics
                    .record_resolution(ResolutionOutcome::Resolved, elapsed_ms);
                info!(
                    cluster = job.cluster_id(),
                    command = job.command_id(),
                    launcher = job.launcher().map(|l| l.name.as_str()).unwrap_or("-"),
                    elapsed_ms,
                    "job resolved"
                );
            }
            Err(e) => {
                self.metrics.record_resolution(e.outcome(), elapsed_ms);
                warn!(stage = %e.stage(), error = %e, elapsed_ms, "job could not be scheduled");
            }
        }
        result
    }

    /// Resolve a batch of jobs on the runtime's worker pool, at most `concurrency` at a time.
    ///
    /// Results are returned in submission order.
    pub async fn resolve_many(
        self: &Arc<Self>,
        jobs: Vec<JobSubmission>,
        concurrency: usize,
    ) -> Vec<(JobId, Result<ResolvedJob, ResolutionError>)> {
        let limit = Arc::new(Semaphore::new(concurrency.max(1)));
        let total = jobs.len();
        let mut set = JoinSet::new();

        for (index, job) in jobs.into_iter().enumerate() {
            let this = Arc::clone(self);
            let limit = Arc::clone(&limit);
            set.spawn(async move {
                let _permit = limit.acquire_owned().await;
                let result = this.resolve(&job).await;
                (index, job.job_id, result)
            });
        }

        let mut out = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(item) => out.push(item),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => warn!(error = %e, "resolution task cancelled"),
            }
        }
        out.sort_by_key(|(index, _, _)| *index);
        out.into_iter().map(|(_, id, r)| (id, r)).collect()
    }

    async fn resolve_inner(&self, sub: &JobSubmission) -> Result<ResolvedJob, ResolutionError> {
        let criteria = &sub.request.criteria;
        let resolution = resolve(criteria, self.catalog.as_ref())?;
        let default = resolution.default_candidate();

        let commands = resolution.commands();
        let command = match self
            .consult(self.command_selector.as_ref(), || CommandSelectionContext {
                job_id: sub.job_id.clone(),
                job_request: sub.request.clone(),
                api_job: sub.api_job,
                commands: commands.clone(),
                command_clusters: resolution.clusters_by_command(),
            })
            .await?
        {
            Some(choice) => commands
                .iter()
                .find(|c| c.id == choice.resource.id)
                .cloned()
                .ok_or_else(|| choice.out_of_set(&choice.resource.id))?,
            None => default.command.clone(),
        };

        let clusters = resolution.clusters_for(&command.id);
        let cluster = match self
            .consult(self.cluster_selector.as_ref(), || ClusterSelectionContext {
                job_id: sub.job_id.clone(),
                job_request: sub.request.clone(),
                api_job: sub.api_job,
                clusters: clusters.clone(),
                command: command.clone(),
            })
            .await?
        {
            Some(choice) => clusters
                .iter()
                .find(|c| c.id == choice.resource.id)
                .cloned()
                .ok_or_else(|| choice.out_of_set(&choice.resource.id))?,
            None => clusters
                .first()
                .cloned()
                .ok_or_else(|| ResolutionError::Script(SelectionError::OutOfSet {
                    selector: "command".into(),
                    resource: command.id.clone(),
                }))?,
        };

        let applications = self.applications(criteria, &command)?;
        let launcher = self.launcher(sub, &cluster, &command).await?;
        let environment = env::job_environment(sub, &resolution, &cluster, &command);

        Ok(ResolvedJob::new(
            sub.job_id.clone(),
            cluster,
            command,
            applications,
            launcher,
            environment,
        ))
    }

    fn applications(
        &self,
        criteria: &ExecutionResourceCriteria,
        command: &Command,
    ) -> Result<Vec<Application>, ResolutionError> {
        if criteria.application_ids().is_empty() {
            return Ok(self.catalog.command_applications(&command.id));
        }
        criteria
            .application_ids()
            .iter()
            .map(|id| {
                self.catalog
                    .application(id)
                    .ok_or_else(|| ResolutionError::ApplicationNotFound(id.clone()))
            })
            .collect()
    }

    async fn launcher(
        &self,
        sub: &JobSubmission,
        cluster: &Cluster,
        command: &Command,
    ) -> Result<Option<LauncherBinding>, ResolutionError> {
        if self.launchers.is_empty() {
            return Ok(None);
        }

        let chosen = self
            .consult(self.launcher_selector.as_ref(), || LauncherSelectionContext {
                job_id: sub.job_id.clone(),
                job_request: sub.request.clone(),
                api_job: sub.api_job,
                launchers: self.launchers.infos(),
                cluster: cluster.clone(),
                command: command.clone(),
            })
            .await?;

        let launcher = match chosen {
            Some(choice) => self
                .launchers
                .get(&choice.resource.name)
                .ok_or_else(|| choice.out_of_set(&choice.resource.name))?,
            None => self.launchers.pick(&sub.request).ok_or_else(|| {
                ResolutionError::LauncherNotFound {
                    tag: sub.request.metadata.labels.launcher_tag().map(str::to_string),
                }
            })?,
        };

        Ok(Some(LauncherBinding {
            name: launcher.name().to_string(),
            extension: launcher.extension(&sub.job_id, cluster, command),
        }))
    }

    /// Ask an optional selector; `None` means "use the deterministic choice".
    async fn consult<C, R>(
        &self,
        selector: Option<&Arc<dyn ResourceSelector<Context = C, Resource = R>>>,
        ctx: impl FnOnce() -> C + Send,
    ) -> Result<Option<Choice<R>>, ResolutionError>
    where
        C: Send + Sync + 'static,
        R: Send + 'static,
    {
        let Some(selector) = selector else {
            return Ok(None);
        };
        let name = selector.name().to_string();

        if !selector.is_ready() {
            debug!(selector = %name, "selector not ready, using deterministic choice");
            self.metrics
                .record_selection(&name, SelectionOutcome::NotConfigured);
            return Ok(None);
        }

        let ctx = ctx();
        match selector.select(&ctx).await {
            Ok(result) => {
                let outcome = if result.resource().is_some() {
                    SelectionOutcome::Selected
                } else {
                    SelectionOutcome::NoPreference
                };
                self.metrics.record_selection(&name, outcome);
                debug!(
                    selector = %name,
                    outcome = outcome.as_label(),
                    rationale = result.rationale().unwrap_or("-"),
                    "selector consulted"
                );
                Ok(result.into_resource().map(|resource| Choice {
                    selector: name,
                    resource,
                }))
            }
            Err(e) if e.is_not_configured() => {
                debug!(selector = %name, "selector not configured, using deterministic choice");
                self.metrics
                    .record_selection(&name, SelectionOutcome::NotConfigured);
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_selection(&name, SelectionOutcome::Failed);
                Err(ResolutionError::Script(e))
            }
        }
    }
}
