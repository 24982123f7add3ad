use serde::{Deserialize, Serialize};

use crate::{ApplicationStatus, ResourceId, Tags, resource::CatalogResource};

/// Application (library, config bundle, ...) staged alongside a command.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Application {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            status: ApplicationStatus::Active,
            tags: Tags::new(),
        }
    }
}

impl CatalogResource for Application {
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
