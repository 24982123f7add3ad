use serde::Serialize;
use serde_json::Value;

use binder_core::coordinator::{JobSubmission, ResolutionError};
use binder_model::{JobId, JobRequest, ModelError, ResolvedJob};

use crate::config::JobEntry;

/// Parse one raw `jobs` entry.
///
/// A malformed entry is reported as a criteria failure carrying whatever job id could be read.
pub fn parse_job(raw: Value) -> Result<JobSubmission, (Option<JobId>, ResolutionError)> {
    let entry: JobEntry = serde_json::from_value(raw).map_err(|e| (None, invalid(e)))?;
    let job_id = entry.job_id.map(JobId::from);

    let request: JobRequest = match serde_json::from_value(entry.request) {
        Ok(request) => request,
        Err(e) => return Err((job_id, invalid(e))),
    };

    let mut submission = JobSubmission::new(request);
    if let Some(id) = job_id {
        submission = submission.with_job_id(id);
    }
    if !entry.api_job {
        submission = submission.detached();
    }
    Ok(submission)
}

fn invalid(e: serde_json::Error) -> ResolutionError {
    ResolutionError::Criteria(ModelError::Invalid(e.to_string()))
}

/// Outcome of one job, as printed by the daemon.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobReport {
    pub fn resolved(job: ResolvedJob) -> Self {
        Self {
            job_id: Some(job.job_id().clone()),
            resolved: Some(job),
            stage: None,
            error: None,
        }
    }

    pub fn failed(job_id: Option<JobId>, err: &ResolutionError) -> Self {
        Self {
            job_id,
            resolved: None,
            stage: Some(err.stage().as_str()),
            error: Some(err.to_string()),
        }
    }

    pub fn from_result(job_id: JobId, result: Result<ResolvedJob, ResolutionError>) -> Self {
        match result {
            Ok(job) => Self::resolved(job),
            Err(e) => Self::failed(Some(job_id), &e),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request() -> Value {
        json!({
            "metadata": { "name": "etl", "user": "alice" },
            "criteria": {
                "clusterCriteria": [ { "tags": ["gpu"] } ],
                "commandCriterion": { "tags": ["spark"] }
            }
        })
    }

    #[test]
    fn parses_entry_with_explicit_id() {
        let sub = parse_job(json!({ "jobId": "j-7", "apiJob": false, "request": request() })).unwrap();

        assert_eq!(sub.job_id.as_str(), "j-7");
        assert!(!sub.api_job);
        assert_eq!(sub.request.metadata.user, "alice");
    }

    #[test]
    fn generates_id_when_missing() {
        let sub = parse_job(json!({ "request": request() })).unwrap();
        assert!(!sub.job_id.as_str().is_empty());
        assert!(sub.api_job);
    }

    #[test]
    fn malformed_request_keeps_job_id() {
        let raw = json!({
            "jobId": "bad",
            "request": { "metadata": { "name": "x", "user": "y" }, "criteria": { "clusterCriteria": [] } }
        });

        let (id, err) = parse_job(raw).unwrap_err();
        assert_eq!(id.unwrap().as_str(), "bad");
        assert_eq!(err.stage().as_str(), "criteria");

        let report = JobReport::failed(Some(JobId::from("bad")), &err);
        let out = serde_json::to_value(&report).unwrap();
        assert_eq!(out["stage"], "criteria");
        assert!(out["error"].as_str().unwrap().starts_with("job could not be scheduled"));
        assert!(out.get("resolved").is_none());
    }

    #[test]
    fn entry_without_request_is_rejected() {
        let (id, err) = parse_job(json!({ "jobId": "x" })).unwrap_err();
        assert!(id.is_none());
        assert!(matches!(err, ResolutionError::Criteria(_)));
    }
}
