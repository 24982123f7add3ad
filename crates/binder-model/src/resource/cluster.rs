use serde::{Deserialize, Serialize};

use crate::{
    ClusterStatus, Priority, ResourceId, Tags,
    resource::CatalogResource,
};

/// Command attached to a cluster with its per-cluster priority (lower wins).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClusterCommand {
    pub command_id: ResourceId,
    #[serde(default)]
    pub priority: Priority,
}

/// Execution cluster as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// Attached commands in catalog order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<ClusterCommand>,
}

impl Cluster {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        status: ClusterStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            status,
            tags: Tags::new(),
            commands: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in tags {
            self.tags.insert(t);
        }
        self
    }

    /// Attach a command with the given priority.
    pub fn with_command(mut self, command_id: impl Into<String>, priority: Priority) -> Self {
        self.commands.push(ClusterCommand {
            command_id: command_id.into(),
            priority,
        });
        self
    }
}

impl CatalogResource for Cluster {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn status_str(&self) -> &'static str {
        self.status.as_str()
    }

    fn tags(&self) -> &Tags {
        &self.tags
    }
}
