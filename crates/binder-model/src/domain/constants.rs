//! Common model-level constants.

/// Job label used to narrow the default agent-launcher choice.
///
/// If a job carries `labels["launcher-tag"] = "<value>"`, only launchers registered
/// with the same tag are considered by the default (non-script) launcher choice.
pub const LABEL_LAUNCHER_TAG: &str = "launcher-tag";

/// Prefix of every environment variable exported for a resolved job.
pub const ENV_PREFIX: &str = "BINDER_";
