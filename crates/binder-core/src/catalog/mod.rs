//! Read-only query contract over the externally owned resource inventory.
//!
//! The resolver only ever sees a [`Catalog`]; persistence, caching and refresh of the
//! inventory belong to the implementor. [`InMemoryCatalog`] is a snapshot implementation
//! used by the daemon and by tests.
mod memory;
pub use memory::InMemoryCatalog;

use binder_model::{Application, Cluster, Command, Priority};

/// Query contract used by the resolver and the coordinator.
///
/// Every listing returns only *usable* resources (clusters `up`, commands `active`),
/// in catalog order. Implementations must return a consistent snapshot for the
/// duration of a single resolution.
pub trait Catalog: Send + Sync {
    /// Usable clusters, in catalog order.
    fn usable_clusters(&self) -> Vec<Cluster>;

    /// Usable commands attached to `cluster_id`, with their per-cluster priority.
    ///
    /// Unknown clusters yield an empty list.
    fn usable_cluster_commands(&self, cluster_id: &str) -> Vec<(Command, Priority)>;

    /// Usable commands independent of any cluster.
    fn usable_commands(&self) -> Vec<Command>;

    /// Look up an application by id, regardless of status.
    fn application(&self, id: &str) -> Option<Application>;

    /// Applications attached to `command_id`, in the command's declared order.
    fn command_applications(&self, command_id: &str) -> Vec<Application>;
}
