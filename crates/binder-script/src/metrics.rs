//! Metrics helpers for script runtimes.
use binder_core::metrics::ScriptOutcome;

use crate::{ExecutionError, ScriptError};

/// Convert a script error to a [`ScriptOutcome`] for metrics.
pub fn evaluation_outcome(error: &ScriptError) -> ScriptOutcome {
    match error {
        ScriptError::Execution {
            source: ExecutionError::Timeout(_),
            ..
        } => ScriptOutcome::Timeout,
        _ => ScriptOutcome::Failure,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeout_maps_to_timeout() {
        let err = ScriptError::Execution {
            script: "s".into(),
            source: ExecutionError::Timeout(Duration::from_millis(5)),
        };
        assert_eq!(evaluation_outcome(&err), ScriptOutcome::Timeout);
    }

    #[test]
    fn raised_and_not_configured_map_to_failure() {
        let raised = ScriptError::Execution {
            script: "s".into(),
            source: ExecutionError::Raised("boom".into()),
        };
        assert_eq!(evaluation_outcome(&raised), ScriptOutcome::Failure);
        assert_eq!(
            evaluation_outcome(&ScriptError::NotConfigured("s".into())),
            ScriptOutcome::Failure
        );
    }
}
