//! Catalog resources as seen by the resolver.
//!
//! These types mirror what the persistence layer owns; this crate never mutates them.
mod status;
pub use status::{ApplicationStatus, ClusterStatus, CommandStatus};

mod cluster;
pub use cluster::{Cluster, ClusterCommand};

mod command;
pub use command::Command;

mod application;
pub use application::Application;

use crate::Tags;

/// Common read-only view over a catalog resource used for criterion matching.
pub trait CatalogResource {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    /// Canonical status string (see the status enums' `as_str`).
    fn status_str(&self) -> &'static str;
    fn tags(&self) -> &Tags;
}
