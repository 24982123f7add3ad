use std::collections::HashMap;

use binder_model::{Application, Cluster, Command, Priority};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Catalog;

/// Raw catalog contents as found in configuration files.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSnapshot {
    #[serde(default)]
    clusters: Vec<Cluster>,
    #[serde(default)]
    commands: Vec<Command>,
    #[serde(default)]
    applications: Vec<Application>,
}

/// Immutable in-memory catalog snapshot.
///
/// Deserializes from `{ "clusters": [...], "commands": [...], "applications": [...] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "CatalogSnapshot", into = "CatalogSnapshot")]
pub struct InMemoryCatalog {
    clusters: Vec<Cluster>,
    commands: Vec<Command>,
    applications: Vec<Application>,
    command_index: HashMap<String, usize>,
    application_index: HashMap<String, usize>,
}

impl InMemoryCatalog {
    pub fn new(
        clusters: Vec<Cluster>,
        commands: Vec<Command>,
        applications: Vec<Application>,
    ) -> Self {
        let command_index = index_by_id(commands.iter().map(|c| c.id.as_str()));
        let application_index = index_by_id(applications.iter().map(|a| a.id.as_str()));
        Self {
            clusters,
            commands,
            applications,
            command_index,
            application_index,
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    fn command(&self, id: &str) -> Option<&Command> {
        self.command_index.get(id).map(|&i| &self.commands[i])
    }
}

// First occurrence wins on duplicate ids.
fn index_by_id<'a>(ids: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.contains_key(id) {
            warn!(id, "duplicate resource id in catalog; keeping first");
            continue;
        }
        index.insert(id.to_string(), i);
    }
    index
}

impl From<CatalogSnapshot> for InMemoryCatalog {
    fn from(s: CatalogSnapshot) -> Self {
        Self::new(s.clusters, s.commands, s.applications)
    }
}

impl From<InMemoryCatalog> for CatalogSnapshot {
    fn from(c: InMemoryCatalog) -> Self {
        Self {
            clusters: c.clusters,
            commands: c.commands,
            applications: c.applications,
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn usable_clusters(&self) -> Vec<Cluster> {
        self.clusters
            .iter()
            .filter(|c| c.status.is_usable())
            .cloned()
            .collect()
    }

    fn usable_cluster_commands(&self, cluster_id: &str) -> Vec<(Command, Priority)> {
        let Some(cluster) = self.clusters.iter().find(|c| c.id == cluster_id) else {
            return Vec::new();
        };
        cluster
            .commands
            .iter()
            .filter_map(|attached| {
                let command = self.command(&attached.command_id)?;
                command
                    .status
                    .is_usable()
                    .then(|| (command.clone(), attached.priority))
            })
            .collect()
    }

    fn usable_commands(&self) -> Vec<Command> {
        self.commands
            .iter()
            .filter(|c| c.status.is_usable())
            .cloned()
            .collect()
    }

    fn application(&self, id: &str) -> Option<Application> {
        self.application_index
            .get(id)
            .map(|&i| self.applications[i].clone())
    }

    fn command_applications(&self, command_id: &str) -> Vec<Application> {
        let Some(command) = self.command(command_id) else {
            return Vec::new();
        };
        command
            .applications
            .iter()
            .filter_map(|id| self.application(id))
            .collect()
    }
}
