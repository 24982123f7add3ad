use std::sync::Arc;

use serde_json::{Value, json};

use binder_core::launcher::{AgentLauncher, LauncherRegistry};
use binder_model::{Cluster, Command, JobId};

use crate::config::LauncherConfig;

/// Launcher defined in the daemon config.
///
/// Contributes an extension describing where the agent should run, plus any static properties.
pub struct ConfiguredLauncher {
    name: String,
    properties: Option<Value>,
}

impl ConfiguredLauncher {
    pub fn new(name: impl Into<String>, properties: Option<Value>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

impl AgentLauncher for ConfiguredLauncher {
    fn name(&self) -> &str {
        &self.name
    }

    fn extension(&self, job_id: &JobId, cluster: &Cluster, command: &Command) -> Option<Value> {
        let mut ext = json!({
            "jobId": job_id,
            "clusterId": cluster.id,
            "commandId": command.id,
        });
        if let (Some(props), Some(map)) = (&self.properties, ext.as_object_mut()) {
            map.insert("properties".into(), props.clone());
        }
        Some(ext)
    }
}

pub fn build_registry(configs: &[LauncherConfig]) -> LauncherRegistry {
    let mut registry = LauncherRegistry::new();
    for cfg in configs {
        registry.register_with_labels(
            Arc::new(ConfiguredLauncher::new(&cfg.name, cfg.properties.clone())),
            cfg.labels.clone(),
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use binder_model::{ClusterStatus, CommandStatus, Labels};

    use super::*;

    #[test]
    fn extension_carries_binding_and_properties() {
        let launcher = ConfiguredLauncher::new("container", Some(json!({"image": "spark:3"})));
        let cluster = Cluster::new("w", "west", "1", ClusterStatus::Up);
        let command = Command::new("spark", "spark", "3", CommandStatus::Active);

        let ext = launcher
            .extension(&JobId::from("j-1"), &cluster, &command)
            .unwrap();

        assert_eq!(ext["jobId"], "j-1");
        assert_eq!(ext["clusterId"], "w");
        assert_eq!(ext["commandId"], "spark");
        assert_eq!(ext["properties"]["image"], "spark:3");
    }

    #[test]
    fn registry_keeps_config_order() {
        let configs = vec![
            LauncherConfig {
                name: "local".into(),
                labels: Labels::new(),
                properties: None,
            },
            LauncherConfig {
                name: "container".into(),
                labels: [("launcher-tag", "docker")].into_iter().collect(),
                properties: None,
            },
        ];

        let registry = build_registry(&configs);
        let names: Vec<_> = registry.infos().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["local", "container"]);
    }
}
