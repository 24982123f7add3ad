use serde::{Deserialize, Serialize};

use crate::{CommandStatus, ResourceId, Tags, resource::CatalogResource};

/// Command (executable entry point) as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// Executable and its fixed arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executable: Vec<String>,
    /// Ids of the applications this command depends on, in load order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<ResourceId>,
}

impl Command {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        status: CommandStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            status,
            tags: Tags::new(),
            executable: Vec::new(),
            applications: Vec::new(),
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

    pub fn with_executable<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.executable = argv.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_applications<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applications = ids.into_iter().map(Into::into).collect();
        self
    }
}

impl CatalogResource for Command {
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
