//! Metrics collection abstraction for binder.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected into the
//! [`crate::coordinator::Coordinator`] and into script runtimes.
mod backend;
pub use backend::{
    MetricsBackend, MetricsHandle, ResolutionOutcome, ScriptOutcome, SelectionOutcome,
};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
