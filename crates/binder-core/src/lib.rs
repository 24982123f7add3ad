pub mod catalog;
pub mod coordinator;
pub mod launcher;
pub mod metrics;
pub mod resolver;
pub mod selector;

pub mod prelude {
    pub use crate::catalog::{Catalog, InMemoryCatalog};
    pub use crate::coordinator::{Coordinator, JobSubmission, ResolutionError, ResolutionStage};
    pub use crate::launcher::{AgentLauncher, LauncherInfo, LauncherRegistry};
    pub use crate::metrics::{MetricsBackend, MetricsHandle, NoOpMetrics};
    pub use crate::resolver::{Candidate, Resolution, ResolveError, resolve};
    pub use crate::selector::{
        ClusterSelectionContext, CommandSelectionContext, LauncherSelectionContext,
        ResourceSelector, SelectionError, SelectionResult,
    };
}
