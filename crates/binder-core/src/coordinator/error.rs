use std::fmt;

use binder_model::ModelError;
use thiserror::Error;

use crate::{metrics::ResolutionOutcome, resolver::ResolveError, selector::SelectionError};

/// Stage of the resolution pipeline a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    Criteria,
    Deterministic,
    Script,
    Applications,
    Launcher,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStage::Criteria => "criteria",
            ResolutionStage::Deterministic => "deterministic",
            ResolutionStage::Script => "script",
            ResolutionStage::Applications => "applications",
            ResolutionStage::Launcher => "launcher",
        }
    }
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job could not be scheduled. Nothing was bound.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("job could not be scheduled: {0}")]
    Criteria(#[from] ModelError),

    #[error("job could not be scheduled: {0}")]
    Deterministic(#[from] ResolveError),

    #[error("job could not be scheduled: {0}")]
    Script(#[from] SelectionError),

    #[error("job could not be scheduled: application '{0}' not found")]
    ApplicationNotFound(String),

    #[error(
        "job could not be scheduled: no agent launcher for launcher-tag '{}'",
        .tag.as_deref().unwrap_or("-")
    )]
    LauncherNotFound { tag: Option<String> },
}

impl ResolutionError {
    pub fn stage(&self) -> ResolutionStage {
        match self {
            ResolutionError::Criteria(_) => ResolutionStage::Criteria,
            ResolutionError::Deterministic(_) => ResolutionStage::Deterministic,
            ResolutionError::Script(_) => ResolutionStage::Script,
            ResolutionError::ApplicationNotFound(_) => ResolutionStage::Applications,
            ResolutionError::LauncherNotFound { .. } => ResolutionStage::Launcher,
        }
    }

    pub(crate) fn outcome(&self) -> ResolutionOutcome {
        match self {
            ResolutionError::Deterministic(_) => ResolutionOutcome::NotFound,
            _ => ResolutionOutcome::Failed,
        }
    }
}
