mod tags;
pub use tags::Tags;

mod labels;
pub use labels::Labels;

mod constants;
pub use constants::{ENV_PREFIX, LABEL_LAUNCHER_TAG};

/// Identifier of a catalog resource (cluster, command or application).
///
/// Identifiers are opaque strings owned by the persistence layer.
pub type ResourceId = String;

/// Priority of a command attached to a cluster.
///
/// Lower values win.
pub type Priority = u32;
