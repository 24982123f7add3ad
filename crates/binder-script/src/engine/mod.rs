//! Script engines behind a common "compiled decision function" capability.
//!
//! An engine compiles script text once; the resulting [`CompiledScript`] is evaluated
//! many times, possibly concurrently. Engines are picked by file extension through an
//! [`EngineRouter`].
mod rhai;
pub use self::rhai::RhaiEngine;

mod rules;
pub use rules::RulesEngine;

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{ExecutionError, ScriptArguments, ScriptLimits};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("entry point '{0}' taking one argument is not defined")]
    MissingEntryPoint(&'static str),

    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Compiles script text into an evaluable handle.
pub trait ScriptEngine: Send + Sync {
    /// Engine name used in logs.
    fn name(&self) -> &'static str;

    /// Lower-case file extensions handled by this engine.
    fn extensions(&self) -> &'static [&'static str];

    fn compile(
        &self,
        text: &str,
        limits: ScriptLimits,
    ) -> Result<Arc<dyn CompiledScript>, CompileError>;
}

/// A compiled decision function.
///
/// `evaluate` is blocking and runs on the blocking pool; implementations should stop
/// promptly once `cancel` fires.
pub trait CompiledScript: Send + Sync {
    fn evaluate(
        &self,
        args: &ScriptArguments,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, ExecutionError>;
}

/// Ordered engine registry keyed by file extension.
#[derive(Clone, Default)]
pub struct EngineRouter {
    engines: Vec<Arc<dyn ScriptEngine>>,
}

impl EngineRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    /// Router with the built-in engines: rhai (`.rhai`) and JSON rules (`.json`).
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(RhaiEngine));
        router.register(Arc::new(RulesEngine));
        router
    }

    /// Register an engine. Earlier registrations win on extension clashes.
    pub fn register(&mut self, engine: Arc<dyn ScriptEngine>) {
        self.engines.push(engine);
    }

    /// First engine handling `extension` (case-insensitive).
    pub fn pick(&self, extension: &str) -> Option<&Arc<dyn ScriptEngine>> {
        self.engines.iter().find(|e| {
            e.extensions()
                .iter()
                .any(|x| x.eq_ignore_ascii_case(extension))
        })
    }
}
