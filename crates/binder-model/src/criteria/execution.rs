use serde::{Deserialize, Serialize};

use crate::{
    Criterion,
    error::{ModelError, ModelResult},
};

/// Resource requirements of a job.
///
/// - `cluster_criteria` are evaluated in declared order; the first satisfiable one wins
///   (this is a priority list, not a union);
/// - `command_criterion` selects the command to run;
/// - `application_ids` optionally pins the applications (in order) instead of using
///   the applications attached to the resolved command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", try_from = "CriteriaFields")]
pub struct ExecutionResourceCriteria {
    cluster_criteria: Vec<Criterion>,
    command_criterion: Criterion,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    application_ids: Vec<String>,
}

impl ExecutionResourceCriteria {
    /// Build validated criteria.
    ///
    /// Fails with [`ModelError::CriteriaInvalid`] if `cluster_criteria` is empty.
    pub fn new(
        cluster_criteria: Vec<Criterion>,
        command_criterion: Criterion,
        application_ids: Vec<String>,
    ) -> ModelResult<Self> {
        if cluster_criteria.is_empty() {
            return Err(ModelError::CriteriaInvalid(
                "at least one cluster criterion is required".into(),
            ));
        }
        let application_ids = application_ids
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self {
            cluster_criteria,
            command_criterion,
            application_ids,
        })
    }

    /// Cluster criteria in priority order.
    pub fn cluster_criteria(&self) -> &[Criterion] {
        &self.cluster_criteria
    }

    pub fn command_criterion(&self) -> &Criterion {
        &self.command_criterion
    }

    /// Requested application ids, in order. Empty means "use the command's applications".
    pub fn application_ids(&self) -> &[String] {
        &self.application_ids
    }
}

#[derive(Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
struct CriteriaFields {
    cluster_criteria: Vec<Criterion>,
    command_criterion: Criterion,
    #[serde(default)]
    application_ids: Vec<String>,
}

impl TryFrom<CriteriaFields> for ExecutionResourceCriteria {
    type Error = ModelError;

    fn try_from(f: CriteriaFields) -> ModelResult<Self> {
        Self::new(f.cluster_criteria, f.command_criterion, f.application_ids)
    }
}
