use std::sync::Arc;

use rhai::{AST, Dynamic, Engine, EvalAltResult, Scope};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    ENTRY_POINT, ExecutionError, ScriptArguments, ScriptLimits,
    engine::{CompileError, CompiledScript, ScriptEngine},
};

/// Embedded [rhai](https://rhai.rs) engine.
///
/// Scripts run sandboxed: no filesystem or network access, bounded nesting and sizes,
/// an operation budget, and cooperative cancellation. `print`/`debug` go to tracing.
///
/// A script defines `fn select(ctx)`; `ctx` is the argument map.
#[derive(Debug, Clone, Copy, Default)]
pub struct RhaiEngine;

fn sandboxed(limits: ScriptLimits, cancel: Option<CancellationToken>) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    engine.set_max_expr_depths(64, 32);
    engine.set_max_call_levels(32);
    engine.set_max_string_size(1 << 20);
    engine.set_max_array_size(100_000);
    engine.set_max_map_size(100_000);
    engine.disable_symbol("eval");
    engine.on_print(|s| debug!(target: "binder_script::rhai", "{s}"));
    engine.on_debug(|s, _, pos| debug!(target: "binder_script::rhai", %pos, "{s}"));
    if let Some(cancel) = cancel {
        engine.on_progress(move |_| {
            if cancel.is_cancelled() {
                Some(Dynamic::UNIT)
            } else {
                None
            }
        });
    }
    engine
}

impl ScriptEngine for RhaiEngine {
    fn name(&self) -> &'static str {
        "rhai"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rhai"]
    }

    fn compile(
        &self,
        text: &str,
        limits: ScriptLimits,
    ) -> Result<Arc<dyn CompiledScript>, CompileError> {
        let ast = sandboxed(limits, None)
            .compile(text)
            .map_err(|e| CompileError::Syntax(e.to_string()))?;

        if !ast
            .iter_functions()
            .any(|f| f.name == ENTRY_POINT && f.params.len() == 1)
        {
            return Err(CompileError::MissingEntryPoint(ENTRY_POINT));
        }
        Ok(Arc::new(CompiledRhai { ast, limits }))
    }
}

struct CompiledRhai {
    ast: AST,
    limits: ScriptLimits,
}

impl CompiledScript for CompiledRhai {
    fn evaluate(
        &self,
        args: &ScriptArguments,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, ExecutionError> {
        let engine = sandboxed(self.limits, Some(cancel.clone()));
        let ctx = rhai::serde::to_dynamic(args)
            .map_err(|e| ExecutionError::Aborted(format!("argument conversion: {e}")))?;

        let out: Dynamic = engine
            .call_fn(&mut Scope::new(), &self.ast, ENTRY_POINT, (ctx,))
            .map_err(classify)?;

        rhai::serde::from_dynamic::<serde_json::Value>(&out)
            .map_err(|e| ExecutionError::MalformedResult(e.to_string()))
    }
}

fn classify(err: Box<EvalAltResult>) -> ExecutionError {
    match *err {
        EvalAltResult::ErrorTerminated(..) => ExecutionError::Aborted("cancelled".into()),
        EvalAltResult::ErrorTooManyOperations(..) => {
            ExecutionError::Aborted("operation budget exhausted".into())
        }
        other => ExecutionError::Raised(other.to_string()),
    }
}
