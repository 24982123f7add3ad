use thiserror::Error;

/// Boxed error carried by [`SelectionError::Execution`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SelectionError {
    /// The selector has nothing to run yet; callers fall back to the deterministic choice.
    #[error("selector '{0}' is not configured")]
    NotConfigured(String),

    /// The decision logic failed (raised, timed out, aborted).
    #[error("selector '{selector}' failed: {source}")]
    Execution {
        selector: String,
        #[source]
        source: BoxError,
    },

    /// The decision logic returned a value of the wrong shape.
    #[error("selector '{selector}' returned an invalid result: {reason}")]
    InvalidResult { selector: String, reason: String },

    /// The decision logic referenced a resource outside the candidate set.
    #[error("selector '{selector}' chose '{resource}', which is not a candidate")]
    OutOfSet { selector: String, resource: String },
}

impl SelectionError {
    /// Returns `true` for the only non-fatal variant.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, SelectionError::NotConfigured(_))
    }
}
