use crate::metrics::backend::{
    MetricsBackend, ResolutionOutcome, ScriptOutcome, SelectionOutcome,
};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_resolution(&self, _: ResolutionOutcome, _: u64) {}

    #[inline(always)]
    fn record_selection(&self, _: &str, _: SelectionOutcome) {}

    #[inline(always)]
    fn record_script_load(&self, _: &str, _: ScriptOutcome, _: u64) {}

    #[inline(always)]
    fn record_script_evaluation(&self, _: &str, _: ScriptOutcome, _: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let metrics = NoOpMetrics;
        for _ in 0..1000 {
            metrics.record_resolution(ResolutionOutcome::Resolved, 3);
            metrics.record_selection("cluster", SelectionOutcome::NoPreference);
            metrics.record_script_load("file:///s.rhai", ScriptOutcome::Success, 10);
            metrics.record_script_evaluation("file:///s.rhai", ScriptOutcome::Timeout, 5000);
        }
    }
}
