mod domain;
pub use domain::{ENV_PREFIX, LABEL_LAUNCHER_TAG};
pub use domain::{Labels, Priority, ResourceId, Tags};

mod error;
pub use error::{ModelError, ModelResult};

mod criteria;
pub use criteria::{Criterion, CriterionBuilder, ExecutionResourceCriteria};

mod resource;
pub use resource::CatalogResource;
pub use resource::{Application, Cluster, ClusterCommand, Command};
pub use resource::{ApplicationStatus, ClusterStatus, CommandStatus};

mod job;
pub use job::{JobId, JobMetadata, JobRequest, LauncherBinding, ResolvedJob};
