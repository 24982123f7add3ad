use std::sync::Arc;

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, proto::MetricFamily};

use binder_core::metrics::{MetricsBackend, ResolutionOutcome, ScriptOutcome, SelectionOutcome};

const NAMESPACE: &str = "binder";

/// Prometheus metrics backend for binder.
///
/// ## Label cardinality
/// All labels are bounded:
/// - `outcome`: fixed per metric family (`resolved`, `selected`, `success`, ...)
/// - `selector`: selector names registered on the coordinator
/// - `script`: script source URIs taken from configuration
#[derive(Clone)]
pub struct PrometheusMetrics {
    resolutions: CounterVec,
    resolution_duration: HistogramVec,
    selections: CounterVec,
    script_loads: CounterVec,
    script_load_duration: HistogramVec,
    script_evaluations: CounterVec,
    script_evaluation_duration: HistogramVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a new prometheus metrics backend with custom registry.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let resolutions = counter(
            &registry,
            "resolutions_total",
            "Total number of job resolutions",
            &["outcome"],
        )?;
        let resolution_duration = histogram(
            &registry,
            "resolution_duration_seconds",
            "Job resolution duration in seconds",
            &["outcome"],
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
        )?;
        let selections = counter(
            &registry,
            "selections_total",
            "Total number of selector consultations",
            &["selector", "outcome"],
        )?;
        let script_loads = counter(
            &registry,
            "script_loads_total",
            "Total number of script load attempts",
            &["script", "outcome"],
        )?;
        let script_load_duration = histogram(
            &registry,
            "script_load_duration_seconds",
            "Script fetch and compile duration in seconds",
            &["script"],
            vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0],
        )?;
        let script_evaluations = counter(
            &registry,
            "script_evaluations_total",
            "Total number of script evaluations",
            &["script", "outcome"],
        )?;
        let script_evaluation_duration = histogram(
            &registry,
            "script_evaluation_duration_seconds",
            "Script evaluation duration in seconds",
            &["script"],
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
        )?;

        Ok(Self {
            resolutions,
            resolution_duration,
            selections,
            script_loads,
            script_load_duration,
            script_evaluations,
            script_evaluation_duration,
            registry,
        })
    }

    /// Create a new prometheus metrics backend with default registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    ///
    /// # Example
    /// ```rust,ignore
    /// let families = metrics.gather();
    /// let encoder = prometheus::TextEncoder::new();
    /// encoder.encode(&families, &mut buffer)?;
    /// ```
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Underlying registry, for registering service metrics next to binder's.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, prometheus::Error> {
    let vec = CounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: Vec<f64>,
) -> Result<HistogramVec, prometheus::Error> {
    let vec = HistogramVec::new(
        HistogramOpts::new(name, help)
            .namespace(NAMESPACE)
            .buckets(buckets),
        labels,
    )?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

#[inline]
fn seconds(duration_ms: u64) -> f64 {
    duration_ms as f64 / 1000.0
}

impl MetricsBackend for PrometheusMetrics {
    fn record_resolution(&self, outcome: ResolutionOutcome, duration_ms: u64) {
        let label = outcome.as_label();
        self.resolutions.with_label_values(&[label]).inc();
        self.resolution_duration
            .with_label_values(&[label])
            .observe(seconds(duration_ms));
    }

    fn record_selection(&self, selector: &str, outcome: SelectionOutcome) {
        self.selections
            .with_label_values(&[selector, outcome.as_label()])
            .inc();
    }

    fn record_script_load(&self, script: &str, outcome: ScriptOutcome, duration_ms: u64) {
        self.script_loads
            .with_label_values(&[script, outcome.as_label()])
            .inc();
        self.script_load_duration
            .with_label_values(&[script])
            .observe(seconds(duration_ms));
    }

    fn record_script_evaluation(&self, script: &str, outcome: ScriptOutcome, duration_ms: u64) {
        self.script_evaluations
            .with_label_values(&[script, outcome.as_label()])
            .inc();
        self.script_evaluation_duration
            .with_label_values(&[script])
            .observe(seconds(duration_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families
            .iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("metric {name} not found"))
    }

    #[test]
    fn can_create_prometheus_metrics() {
        let _metrics = PrometheusMetrics::new().expect("failed to create metrics");
    }

    #[test]
    fn record_resolution_splits_by_outcome() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_resolution(ResolutionOutcome::Resolved, 3);
        metrics.record_resolution(ResolutionOutcome::Resolved, 7);
        metrics.record_resolution(ResolutionOutcome::NotFound, 1);

        let families = metrics.gather();
        let total = family(&families, "binder_resolutions_total");
        assert_eq!(total.get_metric().len(), 2);

        let duration = family(&families, "binder_resolution_duration_seconds");
        assert_eq!(duration.get_metric().len(), 2);
    }

    #[test]
    fn record_selection_is_labelled_per_selector() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_selection("cluster-script", SelectionOutcome::Selected);
        metrics.record_selection("cluster-script", SelectionOutcome::Selected);
        metrics.record_selection("command-script", SelectionOutcome::NoPreference);

        let families = metrics.gather();
        let selections = family(&families, "binder_selections_total");
        assert_eq!(selections.get_metric().len(), 2);

        let text = prometheus::TextEncoder::new()
            .encode_to_string(&families)
            .unwrap();
        assert!(text.contains(r#"selector="cluster-script""#));
        assert!(text.contains(r#"outcome="no_preference""#));
    }

    #[test]
    fn record_script_events() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_script_load("file:///a.rhai", ScriptOutcome::Success, 20);
        metrics.record_script_load("file:///a.rhai", ScriptOutcome::Failure, 5);
        metrics.record_script_evaluation("file:///a.rhai", ScriptOutcome::Timeout, 5000);

        let families = metrics.gather();
        assert_eq!(family(&families, "binder_script_loads_total").get_metric().len(), 2);
        assert_eq!(
            family(&families, "binder_script_load_duration_seconds")
                .get_metric()
                .len(),
            1
        );
        assert_eq!(
            family(&families, "binder_script_evaluations_total")
                .get_metric()
                .len(),
            1
        );
    }

    #[test]
    fn can_use_custom_registry() {
        let registry = Arc::new(Registry::new());
        let metrics = PrometheusMetrics::new_with_registry(registry.clone()).unwrap();

        metrics.record_selection("launcher-script", SelectionOutcome::NotConfigured);
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn same_registry_rejects_second_backend() {
        let registry = Arc::new(Registry::new());
        let _first = PrometheusMetrics::new_with_registry(registry.clone()).unwrap();
        assert!(PrometheusMetrics::new_with_registry(registry).is_err());
    }
}
