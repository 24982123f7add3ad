use binder_model::Criterion;
use thiserror::Error;

/// Failure of the deterministic resolution step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No usable command in the whole catalog satisfies the command criterion.
    #[error("no usable command matches {criterion}")]
    CommandNotFound { criterion: Criterion },

    /// Every cluster criterion was exhausted without a (cluster, command) pair.
    #[error("no usable resources match cluster criteria [{}] with command {command}", join(.unsatisfied))]
    ResourceNotFound {
        unsatisfied: Vec<Criterion>,
        command: Criterion,
    },
}

fn join(criteria: &[Criterion]) -> String {
    criteria
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
