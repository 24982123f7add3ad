use serde::{Deserialize, Serialize};

use crate::{ExecutionResourceCriteria, Labels, Tags};

/// Descriptive metadata of a job, independent of where it will run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    pub name: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// Free-form labels; `launcher-tag` narrows the default launcher choice.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

impl JobMetadata {
    pub fn new(name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            group: None,
            tags: Tags::new(),
            labels: Labels::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key, value);
        self
    }
}

/// Abstract job request: who submits what, and which resources it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub metadata: JobMetadata,
    pub criteria: ExecutionResourceCriteria,
}

impl JobRequest {
    pub fn new(metadata: JobMetadata, criteria: ExecutionResourceCriteria) -> Self {
        Self { metadata, criteria }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_request() {
        let raw = r#"{
            "metadata": { "name": "etl", "user": "alice", "labels": { "launcher-tag": "gpu" } },
            "criteria": {
                "clusterCriteria": [ { "tags": ["gpu"] }, { "tags": ["prod"] } ],
                "commandCriterion": { "tags": ["spark"] }
            }
        }"#;
        let req: JobRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.metadata.user, "alice");
        assert_eq!(req.metadata.labels.get("launcher-tag"), Some("gpu"));
        assert_eq!(req.criteria.cluster_criteria().len(), 2);
        assert!(req.criteria.application_ids().is_empty());
    }

    #[test]
    fn rejects_request_with_empty_command_criterion() {
        let raw = r#"{
            "metadata": { "name": "etl", "user": "alice" },
            "criteria": {
                "clusterCriteria": [ { "tags": ["gpu"] } ],
                "commandCriterion": { }
            }
        }"#;
        assert!(serde_json::from_str::<JobRequest>(raw).is_err());
    }
}
