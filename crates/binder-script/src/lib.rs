mod config;
pub use config::{ScriptLimits, ScriptProperties};

mod error;
pub use error::{ExecutionError, ScriptError};

pub mod engine;
pub use engine::{CompiledScript, EngineRouter, RhaiEngine, RulesEngine, ScriptEngine};

mod metrics;
pub use metrics::evaluation_outcome;

mod runtime;
pub use runtime::{ManagedScript, ScriptArguments, ScriptStatus};

mod source;
pub use source::ScriptSource;

pub mod selector;
pub use selector::{ClusterScriptSelector, CommandScriptSelector, LauncherScriptSelector};

/// Name of the function every decision script must define.
pub const ENTRY_POINT: &str = "select";
