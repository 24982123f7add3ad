use std::sync::Arc;

/// Outcome of a whole job resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Job bound to concrete resources.
    Resolved,
    /// No resources matched the criteria.
    NotFound,
    /// Resolution aborted (selector failure, missing application or launcher).
    Failed,
}

impl ResolutionOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Resolved => "resolved",
            ResolutionOutcome::NotFound => "not_found",
            ResolutionOutcome::Failed => "failed",
        }
    }
}

/// Outcome of consulting a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Selector picked a resource.
    Selected,
    /// Selector abstained; deterministic choice used.
    NoPreference,
    /// Selector not ready; deterministic choice used.
    NotConfigured,
    /// Selector failed; resolution aborted.
    Failed,
}

impl SelectionOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            SelectionOutcome::Selected => "selected",
            SelectionOutcome::NoPreference => "no_preference",
            SelectionOutcome::NotConfigured => "not_configured",
            SelectionOutcome::Failed => "failed",
        }
    }
}

/// Outcome of a script load or evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Success,
    Failure,
    Timeout,
}

impl ScriptOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ScriptOutcome::Success => "success",
            ScriptOutcome::Failure => "failure",
            ScriptOutcome::Timeout => "timeout",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected into the coordinator and the script runtime.
/// Label values passed in are bounded: selector names and script URIs come from configuration.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a finished job resolution.
    ///
    /// # Arguments
    /// - `outcome`: How the resolution ended
    /// - `duration_ms`: Wall time in milliseconds
    fn record_resolution(&self, outcome: ResolutionOutcome, duration_ms: u64);
    /// Record the outcome of consulting a selector.
    ///
    /// # Arguments
    /// - `selector`: Selector name
    /// - `outcome`: What the selector did
    fn record_selection(&self, selector: &str, outcome: SelectionOutcome);
    /// Record a script (re)load attempt.
    ///
    /// # Arguments
    /// - `script`: Script source URI
    /// - `outcome`: Load result
    /// - `duration_ms`: Fetch + compile time in milliseconds
    fn record_script_load(&self, script: &str, outcome: ScriptOutcome, duration_ms: u64);
    /// Record a script evaluation.
    ///
    /// # Arguments
    /// - `script`: Script source URI
    /// - `outcome`: Evaluation result
    /// - `duration_ms`: Time the caller waited, in milliseconds
    fn record_script_evaluation(&self, script: &str, outcome: ScriptOutcome, duration_ms: u64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
