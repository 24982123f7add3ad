//! Managed script runtime.
//!
//! Hosts one externally sourced decision script and keeps it fresh:
//!
//! ```text
//! unconfigured ──warm_up/refresh──► loading ──ok──► ready ◄──┐
//!                                      │                     │ ok / failed (last known good kept)
//!                                      └──err──► failed      reloading
//! ```
//!
//! The compiled handle is published through an atomic pointer: evaluations see the old or
//! the new script, never a partial one. A failed reload never revokes the current handle.
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant, SystemTime},
};

use arc_swap::ArcSwapOption;
use binder_core::metrics::{MetricsHandle, ScriptOutcome, noop_metrics};
use sha2::{Digest, Sha256};
use tokio::{runtime::Handle, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    CompiledScript, EngineRouter, ExecutionError, ScriptError, ScriptProperties, ScriptSource,
    metrics::evaluation_outcome,
};

/// Name → value map handed to a script's entry point.
pub type ScriptArguments = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Disabled, no source, never loaded, or shut down.
    Unconfigured,
    /// First load in progress.
    Loading,
    /// A compiled script is available.
    Ready,
    /// Reload in progress; the previous script stays available.
    Reloading,
    /// Every load so far failed; nothing to evaluate.
    Failed,
}

impl ScriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStatus::Unconfigured => "unconfigured",
            ScriptStatus::Loading => "loading",
            ScriptStatus::Ready => "ready",
            ScriptStatus::Reloading => "reloading",
            ScriptStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currently published compiled script.
struct Loaded {
    compiled: Arc<dyn CompiledScript>,
    /// Hex sha256 of the source text.
    signature: String,
    modified: Option<SystemTime>,
}

struct Inner {
    name: String,
    properties: ScriptProperties,
    source: Result<Option<ScriptSource>, String>,
    engines: EngineRouter,
    metrics: MetricsHandle,
    current: ArcSwapOption<Loaded>,
    status: Mutex<ScriptStatus>,
    load_lock: tokio::sync::Mutex<()>,
    refresh: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

/// Handle to a managed script. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ManagedScript {
    inner: Arc<Inner>,
}

impl fmt::Debug for ManagedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedScript")
            .field("name", &self.inner.name)
            .field("source", &self.source_label())
            .field("status", &self.status())
            .finish()
    }
}

impl ManagedScript {
    /// Create a managed script. Nothing is loaded until [`warm_up`](Self::warm_up),
    /// [`load_now`](Self::load_now) or [`start_refresh`](Self::start_refresh).
    pub fn new(name: impl Into<String>, properties: ScriptProperties, engines: EngineRouter) -> Self {
        let source = match (&properties.source, properties.enabled) {
            (Some(uri), true) => ScriptSource::parse(uri).map(Some),
            _ => Ok(None),
        };
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                properties,
                source,
                engines,
                metrics: noop_metrics(),
                current: ArcSwapOption::empty(),
                status: Mutex::new(ScriptStatus::Unconfigured),
                load_lock: tokio::sync::Mutex::new(()),
                refresh: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Replace the metrics backend. Must be called before the handle is cloned.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.metrics = metrics;
        } else {
            warn!(script = %self.inner.name, "metrics not replaced: handle already shared");
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn properties(&self) -> &ScriptProperties {
        &self.inner.properties
    }

    pub fn status(&self) -> ScriptStatus {
        *self
            .inner
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-blocking readiness probe.
    pub fn is_ready_to_evaluate(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Trigger a background load on the current tokio runtime and return immediately.
    pub fn warm_up(&self) {
        if !self.is_configured() {
            debug!(script = %self.inner.name, "warm-up skipped: script not configured");
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(script = %self.inner.name, "warm-up skipped: no tokio runtime");
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            let _ = this.load(false).await;
        });
    }

    /// Load (or reload) the script now, waiting for the outcome.
    ///
    /// On failure the previously loaded script, if any, stays active.
    pub async fn load_now(&self) -> Result<(), ScriptError> {
        self.load(true).await
    }

    /// Start the periodic refresh loop on the current tokio runtime.
    ///
    /// With `auto_load` the first load happens immediately; otherwise after one interval.
    /// Each tick recompiles only when the source changed. Calling it twice is a no-op.
    pub fn start_refresh(&self) {
        if !self.is_configured() {
            debug!(script = %self.inner.name, "refresh not started: script not configured");
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(script = %self.inner.name, "refresh not started: no tokio runtime");
            return;
        };
        let mut slot = self
            .inner
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let this = self.clone();
        let period = Duration::from_millis(self.inner.properties.refresh_interval_ms.max(1));
        let auto_load = self.inner.properties.auto_load;
        let token = self.inner.shutdown.clone();

        *slot = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !auto_load {
                // first tick completes immediately
                ticker.tick().await;
            }
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = this.load(false).await;
                    }
                }
            }
            debug!(script = %this.inner.name, "refresh loop stopped");
        }));
        info!(script = %self.inner.name, period_ms = period.as_millis() as u64, "script refresh scheduled");
    }

    /// Stop refreshing, cancel in-flight evaluations and drop the compiled script.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let task = self
            .inner
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
        // wait out an in-flight load; it sees the cancelled token and publishes nothing
        let _guard = self.inner.load_lock.lock().await;
        self.inner.current.store(None);
        self.set_status(ScriptStatus::Unconfigured);
        debug!(script = %self.inner.name, "script shut down");
    }

    /// Evaluate the script's entry point with `args`, waiting at most `timeout_ms`.
    ///
    /// - nothing loaded yet → [`ScriptError::NotConfigured`];
    /// - raised, timed out or malformed → [`ScriptError::Execution`].
    ///
    /// On timeout the evaluation is cancelled cooperatively; the blocking thread may
    /// outlive the call briefly.
    #[instrument(level = "debug", skip_all, fields(script = %self.inner.name))]
    pub async fn evaluate(&self, args: ScriptArguments) -> Result<serde_json::Value, ScriptError> {
        let label = self.source_label();
        let started = Instant::now();

        let result = self.evaluate_inner(args).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = match &result {
            Ok(_) => ScriptOutcome::Success,
            Err(e) => evaluation_outcome(e),
        };
        self.inner
            .metrics
            .record_script_evaluation(&label, outcome, elapsed_ms);
        if let Err(e) = &result {
            debug!(error = %e, elapsed_ms, "script evaluation failed");
        }
        result
    }

    async fn evaluate_inner(&self, args: ScriptArguments) -> Result<serde_json::Value, ScriptError> {
        let Some(loaded) = self.inner.current.load_full() else {
            return Err(ScriptError::NotConfigured(self.inner.name.clone()));
        };

        let timeout = Duration::from_millis(self.inner.properties.timeout_ms);
        let cancel = self.inner.shutdown.child_token();
        let task_cancel = cancel.clone();
        let compiled = Arc::clone(&loaded.compiled);
        let task = tokio::task::spawn_blocking(move || compiled.evaluate(&args, &task_cancel));

        let result = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ExecutionError::Aborted(join.to_string())),
            Err(_) => {
                cancel.cancel();
                Err(ExecutionError::Timeout(timeout))
            }
        };
        result.map_err(|source| ScriptError::Execution {
            script: self.inner.name.clone(),
            source,
        })
    }

    fn is_configured(&self) -> bool {
        !matches!(self.inner.source, Ok(None)) && !self.inner.shutdown.is_cancelled()
    }

    fn source_label(&self) -> String {
        match &self.inner.source {
            Ok(Some(source)) => source.to_string(),
            _ => self.inner.properties.source.clone().unwrap_or_default(),
        }
    }

    fn set_status(&self, status: ScriptStatus) {
        *self
            .inner
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// One load attempt; `force` skips the modification-time shortcut.
    #[instrument(level = "debug", skip(self), fields(script = %self.inner.name))]
    async fn load(&self, force: bool) -> Result<(), ScriptError> {
        let source = match &self.inner.source {
            Ok(Some(source)) => source.clone(),
            Ok(None) => return Err(ScriptError::NotConfigured(self.inner.name.clone())),
            Err(reason) => {
                self.set_status(ScriptStatus::Failed);
                error!(reason = %reason, "script location is invalid");
                return Err(ScriptError::loading(&self.inner.name, reason));
            }
        };
        if self.inner.shutdown.is_cancelled() {
            return Err(ScriptError::NotConfigured(self.inner.name.clone()));
        }

        let _guard = self.inner.load_lock.lock().await;
        if self.inner.shutdown.is_cancelled() {
            return Err(ScriptError::NotConfigured(self.inner.name.clone()));
        }
        let had_previous = self.is_ready_to_evaluate();
        self.set_status(if had_previous {
            ScriptStatus::Reloading
        } else {
            ScriptStatus::Loading
        });

        let label = source.to_string();
        let started = Instant::now();
        let result = self.fetch_and_compile(&source, force).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(true) => {
                self.inner
                    .metrics
                    .record_script_load(&label, ScriptOutcome::Success, elapsed_ms);
                info!(source = %label, elapsed_ms, "script compiled");
            }
            Ok(false) => debug!(source = %label, "script unchanged"),
            Err(ScriptError::NotConfigured(_)) => {
                debug!(source = %label, "load abandoned: script shut down");
            }
            Err(e) => {
                self.inner
                    .metrics
                    .record_script_load(&label, ScriptOutcome::Failure, elapsed_ms);
                if had_previous {
                    warn!(source = %label, error = %e, "script reload failed; keeping last known good");
                } else {
                    error!(source = %label, error = %e, "script load failed");
                }
            }
        }

        self.set_status(if self.inner.shutdown.is_cancelled() {
            ScriptStatus::Unconfigured
        } else if self.is_ready_to_evaluate() {
            ScriptStatus::Ready
        } else {
            ScriptStatus::Failed
        });
        result.map(|_| ())
    }

    /// Returns `Ok(true)` when a new script was published, `Ok(false)` when unchanged.
    async fn fetch_and_compile(&self, source: &ScriptSource, force: bool) -> Result<bool, ScriptError> {
        let name = &self.inner.name;
        let current = self.inner.current.load_full();

        if !force {
            let modified = source.modified().await;
            if let (Some(cur), Some(m)) = (&current, modified) {
                if cur.modified == Some(m) {
                    return Ok(false);
                }
            }
        }

        let fetched = source
            .fetch()
            .await
            .map_err(|e| ScriptError::loading(name, e))?;
        let signature = hex::encode(Sha256::digest(fetched.text.as_bytes()));

        if let Some(cur) = &current {
            if cur.signature == signature {
                if cur.modified != fetched.modified {
                    self.inner.current.store(Some(Arc::new(Loaded {
                        compiled: Arc::clone(&cur.compiled),
                        signature,
                        modified: fetched.modified,
                    })));
                }
                return Ok(false);
            }
        }

        let extension = source
            .extension()
            .ok_or_else(|| ScriptError::loading(name, "cannot determine file extension"))?;
        let engine = self
            .inner
            .engines
            .pick(&extension)
            .cloned()
            .ok_or_else(|| {
                ScriptError::loading(name, format!("no script engine for extension '{extension}'"))
            })?;

        let limits = self.inner.properties.limits();
        let text = fetched.text;
        let compiled = tokio::task::spawn_blocking(move || engine.compile(&text, limits))
            .await
            .map_err(|e| ScriptError::loading(name, e))?
            .map_err(|e| ScriptError::loading(name, e))?;

        if self.inner.shutdown.is_cancelled() {
            return Err(ScriptError::NotConfigured(name.clone()));
        }

        self.inner.current.store(Some(Arc::new(Loaded {
            compiled,
            signature,
            modified: fetched.modified,
        })));
        Ok(true)
    }
}
