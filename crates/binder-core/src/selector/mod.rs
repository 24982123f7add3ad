//! Pluggable selection contract.
//!
//! A selector refines the deterministic candidate set: it picks a member, or abstains.
//! Abstaining and failing are distinct outcomes: the former falls back to the
//! deterministic choice, the latter aborts the resolution.
mod context;
pub use context::{ClusterSelectionContext, CommandSelectionContext, LauncherSelectionContext};

mod error;
pub use error::{BoxError, SelectionError};

use async_trait::async_trait;

/// Outcome of a selector that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionResult<R> {
    resource: Option<R>,
    rationale: Option<String>,
}

impl<R> SelectionResult<R> {
    pub fn new(resource: Option<R>, rationale: Option<String>) -> Self {
        Self {
            resource,
            rationale,
        }
    }

    pub fn selected(resource: R) -> Self {
        Self::new(Some(resource), None)
    }

    pub fn no_preference() -> Self {
        Self::new(None, None)
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn into_resource(self) -> Option<R> {
        self.resource
    }
}

/// A selector for one use case (cluster, command, agent launcher).
#[async_trait]
pub trait ResourceSelector: Send + Sync {
    type Context: Send + Sync;
    type Resource: Send;

    /// Selector name used in logs and metrics.
    fn name(&self) -> &str;

    /// Non-blocking readiness probe. A selector that is not ready is skipped.
    fn is_ready(&self) -> bool {
        true
    }

    /// Choose a resource from the context, or abstain.
    ///
    /// Implementations must never return a resource outside the context's set.
    async fn select(
        &self,
        ctx: &Self::Context,
    ) -> Result<SelectionResult<Self::Resource>, SelectionError>;
}
