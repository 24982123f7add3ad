use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Normalize user-provided status strings: lowercase, no `-`/`_`/spaces.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Lifecycle status of a cluster.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum ClusterStatus {
    /// Cluster accepts jobs.
    #[default]
    Up,
    /// Cluster is temporarily not accepting jobs.
    OutOfService,
    /// Cluster is gone.
    Terminated,
}

impl ClusterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Up => "up",
            ClusterStatus::OutOfService => "outOfService",
            ClusterStatus::Terminated => "terminated",
        }
    }

    /// Only `up` clusters can receive jobs.
    pub fn is_usable(&self) -> bool {
        matches!(self, ClusterStatus::Up)
    }
}

impl FromStr for ClusterStatus {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match normalize(s).as_str() {
            "up" => Ok(ClusterStatus::Up),
            "outofservice" => Ok(ClusterStatus::OutOfService),
            "terminated" => Ok(ClusterStatus::Terminated),
            _ => Err(ModelError::UnknownClusterStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a command.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum CommandStatus {
    #[default]
    Active,
    /// Still runnable elsewhere but must not be picked for new jobs.
    Deprecated,
    Inactive,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Active => "active",
            CommandStatus::Deprecated => "deprecated",
            CommandStatus::Inactive => "inactive",
        }
    }

    /// Only `active` commands can be bound to new jobs.
    pub fn is_usable(&self) -> bool {
        matches!(self, CommandStatus::Active)
    }
}

impl FromStr for CommandStatus {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match normalize(s).as_str() {
            "active" => Ok(CommandStatus::Active),
            "deprecated" => Ok(CommandStatus::Deprecated),
            "inactive" => Ok(CommandStatus::Inactive),
            _ => Err(ModelError::UnknownCommandStatus(s.to_string())),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an application.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum ApplicationStatus {
    #[default]
    Active,
    Deprecated,
    Inactive,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Active => "active",
            ApplicationStatus::Deprecated => "deprecated",
            ApplicationStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match normalize(s).as_str() {
            "active" => Ok(ApplicationStatus::Active),
            "deprecated" => Ok(ApplicationStatus::Deprecated),
            "inactive" => Ok(ApplicationStatus::Inactive),
            _ => Err(ModelError::UnknownApplicationStatus(s.to_string())),
        }
    }
}
