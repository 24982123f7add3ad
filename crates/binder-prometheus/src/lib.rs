//! Prometheus metrics backend for the binder job resolver.
//!
//! [`PrometheusMetrics`] implements [`binder_core::metrics::MetricsBackend`] and can be handed to
//! the coordinator and to every managed script.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use binder_core::prelude::*;
//! use binder_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//!
//! let catalog = Arc::new(InMemoryCatalog::default());
//! let _coordinator = Coordinator::new(catalog).with_metrics(handle);
//!
//! let _families = metrics.gather();
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `binder_resolutions_total{outcome}` - Counter
//! - `binder_resolution_duration_seconds{outcome}` - Histogram
//! - `binder_selections_total{selector, outcome}` - Counter
//! - `binder_script_loads_total{script, outcome}` - Counter
//! - `binder_script_load_duration_seconds{script}` - Histogram
//! - `binder_script_evaluations_total{script, outcome}` - Counter
//! - `binder_script_evaluation_duration_seconds{script}` - Histogram
//!
//! No HTTP endpoint is provided; encode [`PrometheusMetrics::gather`] with [`TextEncoder`]
//! from whatever server the embedding service already runs.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
