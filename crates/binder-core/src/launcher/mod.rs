//! Registry of in-process agent launchers.
//!
//! Launchers are checked in registration order. The default choice is the first launcher
//! that supports the job and, when the job carries a `launcher-tag` label, advertises the
//! same tag. A launcher selector may override the default with any registered launcher.
use std::sync::Arc;

use binder_model::{Cluster, Command, JobId, JobRequest, Labels};
use serde::Serialize;
use tracing::{debug, instrument};

/// Launches the agent process for a resolved job.
///
/// Only the binding side lives here: a launcher reports whether it can handle a job and
/// contributes an opaque extension payload carried by the resolved job.
pub trait AgentLauncher: Send + Sync {
    /// Launcher name used in logs, selection and the resolved job.
    fn name(&self) -> &str;

    /// Returns `true` if this launcher can handle the given request.
    fn supports(&self, _request: &JobRequest) -> bool {
        true
    }

    /// Extension payload attached to the resolved job, if any.
    fn extension(
        &self,
        job_id: &JobId,
        cluster: &Cluster,
        command: &Command,
    ) -> Option<serde_json::Value>;
}

/// Public description of a registered launcher, as exposed to selectors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// Single launcher entry with optional static labels used for routing.
pub struct LauncherEntry {
    pub launcher: Arc<dyn AgentLauncher>,
    pub labels: Labels,
}

#[derive(Default)]
pub struct LauncherRegistry {
    launchers: Vec<LauncherEntry>,
}

impl LauncherRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            launchers: Vec::new(),
        }
    }

    /// Register a launcher without labels.
    #[inline]
    pub fn register(&mut self, launcher: Arc<dyn AgentLauncher>) {
        self.launchers.push(LauncherEntry {
            launcher,
            labels: Labels::default(),
        });
    }

    /// Register a launcher with static labels (see [`binder_model::LABEL_LAUNCHER_TAG`]).
    #[inline]
    pub fn register_with_labels(&mut self, launcher: Arc<dyn AgentLauncher>, labels: Labels) {
        self.launchers.push(LauncherEntry { launcher, labels });
    }

    pub fn is_empty(&self) -> bool {
        self.launchers.is_empty()
    }

    /// Descriptions of every registered launcher, in registration order.
    pub fn infos(&self) -> Vec<LauncherInfo> {
        self.launchers
            .iter()
            .map(|e| LauncherInfo {
                name: e.launcher.name().to_string(),
                labels: e.labels.clone(),
            })
            .collect()
    }

    /// Find a registered launcher by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentLauncher>> {
        self.launchers
            .iter()
            .find(|e| e.launcher.name() == name)
            .map(|e| &e.launcher)
    }

    /// Pick the default launcher for a request.
    ///
    /// Routing rules:
    /// - filter launchers by `AgentLauncher::supports(request)`;
    /// - if the request carries a `launcher-tag` label, keep only launchers advertising it;
    /// - pick the first matching entry.
    #[instrument(level = "debug", skip_all, fields(job = %request.metadata.name))]
    pub fn pick(&self, request: &JobRequest) -> Option<&Arc<dyn AgentLauncher>> {
        let wanted = request.metadata.labels.launcher_tag();

        let picked = self
            .launchers
            .iter()
            .filter(|entry| entry.launcher.supports(request))
            .filter(move |entry| match wanted {
                Some(wanted) => entry.labels.launcher_tag() == Some(wanted),
                None => true,
            })
            .map(|entry| &entry.launcher)
            .next();

        debug!(
            wanted = wanted.unwrap_or("-"),
            picked = picked.map(|l| l.name()).unwrap_or("-"),
            "launcher routing"
        );
        picked
    }

    /// Returns `true` if at least one registered launcher advertises the given tag.
    pub fn contains_launcher_tag(&self, tag: &str) -> bool {
        self.launchers
            .iter()
            .any(|e| e.labels.launcher_tag() == Some(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_model::{Criterion, ExecutionResourceCriteria, JobMetadata, LABEL_LAUNCHER_TAG};

    struct Named(&'static str);

    impl AgentLauncher for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn extension(&self, _: &JobId, _: &Cluster, _: &Command) -> Option<serde_json::Value> {
            Some(serde_json::json!({ "launcher": self.0 }))
        }
    }

    struct NeverSupports;

    impl AgentLauncher for NeverSupports {
        fn name(&self) -> &str {
            "never"
        }

        fn supports(&self, _: &JobRequest) -> bool {
            false
        }

        fn extension(&self, _: &JobId, _: &Cluster, _: &Command) -> Option<serde_json::Value> {
            None
        }
    }

    fn request(meta: JobMetadata) -> JobRequest {
        let c = Criterion::with_tags(["any"]).unwrap();
        JobRequest::new(
            meta,
            ExecutionResourceCriteria::new(vec![c.clone()], c, Vec::new()).unwrap(),
        )
    }

    fn labels(tag: &str) -> Labels {
        let mut l = Labels::new();
        l.insert(LABEL_LAUNCHER_TAG, tag);
        l
    }

    #[test]
    fn pick_returns_first_supporting_launcher() {
        let mut reg = LauncherRegistry::new();
        reg.register(Arc::new(NeverSupports));
        reg.register(Arc::new(Named("local")));
        reg.register(Arc::new(Named("container")));

        let picked = reg.pick(&request(JobMetadata::new("j", "u"))).unwrap();
        assert_eq!(picked.name(), "local");
    }

    #[test]
    fn pick_respects_launcher_tag() {
        let mut reg = LauncherRegistry::new();
        reg.register_with_labels(Arc::new(Named("local")), labels("cpu"));
        reg.register_with_labels(Arc::new(Named("container")), labels("gpu"));

        let req = request(JobMetadata::new("j", "u").with_label(LABEL_LAUNCHER_TAG, "gpu"));
        assert_eq!(reg.pick(&req).unwrap().name(), "container");
        assert!(reg.contains_launcher_tag("cpu"));
        assert!(!reg.contains_launcher_tag("arm"));
    }

    #[test]
    fn pick_fails_when_tag_is_unknown() {
        let mut reg = LauncherRegistry::new();
        reg.register(Arc::new(Named("local")));

        let req = request(JobMetadata::new("j", "u").with_label(LABEL_LAUNCHER_TAG, "gpu"));
        assert!(reg.pick(&req).is_none());
    }

    #[test]
    fn infos_and_get_follow_registration() {
        let mut reg = LauncherRegistry::new();
        reg.register(Arc::new(Named("local")));
        reg.register_with_labels(Arc::new(Named("container")), labels("gpu"));

        let infos = reg.infos();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].labels.get(LABEL_LAUNCHER_TAG), Some("gpu"));
        assert!(reg.get("container").is_some());
        assert!(reg.get("nope").is_none());
    }
}
