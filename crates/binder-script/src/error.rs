use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// Nothing loaded yet (or disabled); callers fall back to deterministic behaviour.
    #[error("script '{0}' is not configured")]
    NotConfigured(String),

    #[error("script '{script}' failed: {source}")]
    Execution {
        script: String,
        #[source]
        source: ExecutionError,
    },

    #[error("failed to load script '{script}': {reason}")]
    Loading { script: String, reason: String },
}

impl ScriptError {
    pub(crate) fn loading(script: &str, reason: impl ToString) -> Self {
        ScriptError::Loading {
            script: script.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("script raised an error: {0}")]
    Raised(String),

    #[error("malformed result: {0}")]
    MalformedResult(String),

    #[error("evaluation aborted: {0}")]
    Aborted(String),
}
