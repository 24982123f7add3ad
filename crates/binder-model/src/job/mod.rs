mod id;
pub use id::JobId;

mod request;
pub use request::{JobMetadata, JobRequest};

mod resolved;
pub use resolved::{LauncherBinding, ResolvedJob};
