use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use binder_core::{
    coordinator::Coordinator,
    metrics::{MetricsHandle, noop_metrics},
};
use binder_observe::{LoggerLevel, init_local_offset, init_logger};
use binder_prometheus::{PrometheusMetrics, TextEncoder};
use binder_script::{
    ClusterScriptSelector, CommandScriptSelector, EngineRouter, LauncherScriptSelector,
    ManagedScript, ScriptProperties,
};

mod config;
mod jobs;
mod launcher;

use config::DaemonConfig;
use jobs::{JobReport, parse_job};

/// Resolve a batch of job requests against a catalog snapshot and print the bindings.
#[derive(Debug, Parser)]
#[command(name = "binderd", version)]
struct Cli {
    /// Path to the JSON config file.
    #[arg(short, long, env = "BINDER_CONFIG", default_value = "binderd.json")]
    config: PathBuf,
    /// Log filter, overrides `logger.level`.
    #[arg(long, env = "BINDER_LOG")]
    log_level: Option<LoggerLevel>,
    /// Overrides `concurrency`.
    #[arg(long)]
    concurrency: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // must run before the runtime spawns worker threads
    init_local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // 1) config + logger
    let mut cfg = DaemonConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        cfg.logger = cfg.logger.with_level(level);
    }
    init_logger(&cfg.logger)?;
    info!(config = %cli.config.display(), "binderd starting");

    // 2) metrics
    let prometheus = cfg.metrics.then(PrometheusMetrics::new).transpose()?;
    let metrics: MetricsHandle = match &prometheus {
        Some(p) => Arc::new(p.clone()),
        None => noop_metrics(),
    };

    // 3) scripts
    let engines = EngineRouter::with_defaults();
    let command_script = managed("command", &cfg.scripts.command, &engines, &metrics).await;
    let cluster_script = managed("cluster", &cfg.scripts.cluster, &engines, &metrics).await;
    let launcher_script = managed("launcher", &cfg.scripts.launcher, &engines, &metrics).await;

    // 4) coordinator
    let mut coordinator = Coordinator::new(Arc::new(cfg.catalog.clone()))
        .with_launchers(launcher::build_registry(&cfg.launchers))
        .with_metrics(metrics.clone());
    if let Some(script) = &command_script {
        coordinator =
            coordinator.with_command_selector(Arc::new(CommandScriptSelector::new(script.clone())));
    }
    if let Some(script) = &cluster_script {
        coordinator =
            coordinator.with_cluster_selector(Arc::new(ClusterScriptSelector::new(script.clone())));
    }
    if let Some(script) = &launcher_script {
        coordinator = coordinator
            .with_launcher_selector(Arc::new(LauncherScriptSelector::new(script.clone())));
    }
    let coordinator = Arc::new(coordinator);

    // 5) jobs
    let raw_jobs = std::mem::take(&mut cfg.jobs);
    let mut reports: Vec<Option<JobReport>> = (0..raw_jobs.len()).map(|_| None).collect();
    let mut positions = Vec::new();
    let mut submissions = Vec::new();
    for (index, raw) in raw_jobs.into_iter().enumerate() {
        match parse_job(raw) {
            Ok(submission) => {
                positions.push(index);
                submissions.push(submission);
            }
            Err((job_id, err)) => {
                warn!(index, error = %err, "rejecting malformed job");
                reports[index] = Some(JobReport::failed(job_id, &err));
            }
        }
    }

    let concurrency = cli.concurrency.unwrap_or_else(|| cfg.concurrency());
    let results = coordinator.resolve_many(submissions, concurrency).await;
    for (index, (job_id, result)) in positions.into_iter().zip(results) {
        reports[index] = Some(JobReport::from_result(job_id, result));
    }

    // 6) output
    let reports: Vec<JobReport> = reports.into_iter().flatten().collect();
    let resolved = reports.iter().filter(|r| r.is_resolved()).count();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    info!(
        resolved,
        failed = reports.len() - resolved,
        "batch finished"
    );

    if let Some(p) = &prometheus {
        eprint!("{}", TextEncoder::new().encode_to_string(&p.gather())?);
    }

    // 7) shutdown
    for script in [command_script, cluster_script, launcher_script]
        .into_iter()
        .flatten()
    {
        script.shutdown().await;
    }
    Ok(())
}

/// Build and load an enabled script, then keep it refreshed in the background.
///
/// A failed first load is logged; the selector then falls back to deterministic choices.
async fn managed(
    name: &str,
    properties: &ScriptProperties,
    engines: &EngineRouter,
    metrics: &MetricsHandle,
) -> Option<ManagedScript> {
    if !properties.enabled {
        return None;
    }
    let script = ManagedScript::new(name, properties.clone(), engines.clone())
        .with_metrics(metrics.clone());
    if let Err(e) = script.load_now().await {
        warn!(script = name, error = %e, "initial script load failed");
    }
    script.start_refresh();
    Some(script)
}
