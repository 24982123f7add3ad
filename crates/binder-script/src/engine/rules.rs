use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::{
    ExecutionError, ScriptArguments, ScriptLimits,
    engine::{CompileError, CompiledScript, ScriptEngine},
};

/// Declarative JSON rule engine.
///
/// ```json
/// {
///   "rules": [
///     {
///       "when": [
///         { "path": "/jobRequest/metadata/user", "equals": "etl-bot" },
///         { "path": "/jobRequest/metadata/tags", "contains": "nightly" }
///       ],
///       "select": "cluster-batch",
///       "rationale": "nightly etl runs on the batch cluster"
///     }
///   ],
///   "fallback": { "rationale": "no match found" }
/// }
/// ```
///
/// Rules are tried in order; the first whose conditions all hold decides. Paths are
/// JSON pointers into the argument map. Without a matching rule the fallback decides,
/// and without a fallback the result is "no preference".
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesEngine;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RuleSet {
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    fallback: Option<Decision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Rule {
    #[serde(default)]
    when: Vec<Condition>,
    #[serde(default)]
    select: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Decision {
    #[serde(default)]
    select: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Condition {
    path: String,
    #[serde(default)]
    equals: Option<Value>,
    #[serde(default)]
    contains: Option<Value>,
    #[serde(default)]
    exists: Option<bool>,
}

impl Condition {
    fn validate(&self) -> Result<(), CompileError> {
        if !self.path.is_empty() && !self.path.starts_with('/') {
            return Err(CompileError::Invalid(format!(
                "path '{}' is not a JSON pointer",
                self.path
            )));
        }
        let tests = [
            self.equals.is_some(),
            self.contains.is_some(),
            self.exists.is_some(),
        ];
        if tests.iter().filter(|t| **t).count() != 1 {
            return Err(CompileError::Invalid(format!(
                "condition on '{}' must set exactly one of equals, contains, exists",
                self.path
            )));
        }
        Ok(())
    }

    fn holds(&self, doc: &Value) -> bool {
        let found = doc.pointer(&self.path);
        if let Some(expected) = self.exists {
            return found.is_some_and(|v| !v.is_null()) == expected;
        }
        let Some(found) = found else {
            return false;
        };
        if let Some(expected) = &self.equals {
            return found == expected;
        }
        match (&self.contains, found) {
            (Some(needle), Value::Array(items)) => items.contains(needle),
            (Some(Value::String(needle)), Value::String(hay)) => hay.contains(needle.as_str()),
            _ => false,
        }
    }
}

fn decision(select: &Option<String>, rationale: &Option<String>) -> Value {
    json!({ "resource": select, "rationale": rationale })
}

impl ScriptEngine for RulesEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn compile(
        &self,
        text: &str,
        _limits: ScriptLimits,
    ) -> Result<Arc<dyn CompiledScript>, CompileError> {
        let set: RuleSet =
            serde_json::from_str(text).map_err(|e| CompileError::Syntax(e.to_string()))?;
        for rule in &set.rules {
            for cond in &rule.when {
                cond.validate()?;
            }
        }
        Ok(Arc::new(set))
    }
}

impl CompiledScript for RuleSet {
    fn evaluate(
        &self,
        args: &ScriptArguments,
        _cancel: &CancellationToken,
    ) -> Result<Value, ExecutionError> {
        let doc = Value::Object(args.clone());
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.when.iter().all(|c| c.holds(&doc)))
        {
            return Ok(decision(&rule.select, &rule.rationale));
        }
        Ok(self
            .fallback
            .as_ref()
            .map(|f| decision(&f.select, &f.rationale))
            .unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> Arc<dyn CompiledScript> {
        RulesEngine
            .compile(text, ScriptLimits { max_operations: 0 })
            .unwrap()
    }

    fn eval(script: &Arc<dyn CompiledScript>, args: Value) -> Value {
        let Value::Object(map) = args else {
            panic!("object expected")
        };
        script.evaluate(&map, &CancellationToken::new()).unwrap()
    }

    const RULES: &str = r#"{
        "rules": [
            { "when": [ { "path": "/jobRequest/metadata/user", "equals": "etl-bot" } ],
              "select": "batch", "rationale": "bot" },
            { "when": [ { "path": "/jobRequest/metadata/tags", "contains": "adhoc" },
                        { "path": "/apiJob", "equals": true } ],
              "select": "interactive" },
            { "when": [ { "path": "/jobRequest/metadata/group", "exists": true } ],
              "rationale": "grouped jobs take the default" }
        ],
        "fallback": { "rationale": "no match found" }
    }"#;

    #[test]
    fn first_matching_rule_decides() {
        let s = compile(RULES);
        let out = eval(
            &s,
            json!({ "jobRequest": { "metadata": { "user": "etl-bot", "tags": ["adhoc"] } }, "apiJob": true }),
        );
        assert_eq!(out, json!({ "resource": "batch", "rationale": "bot" }));

        let out = eval(
            &s,
            json!({ "jobRequest": { "metadata": { "user": "alice", "tags": ["adhoc"] } }, "apiJob": true }),
        );
        assert_eq!(out["resource"], "interactive");
        assert!(out["rationale"].is_null());
    }

    #[test]
    fn abstaining_rule_and_fallback_carry_rationale() {
        let s = compile(RULES);
        let out = eval(
            &s,
            json!({ "jobRequest": { "metadata": { "user": "alice", "group": "eng" } } }),
        );
        assert!(out["resource"].is_null());
        assert_eq!(out["rationale"], "grouped jobs take the default");

        let out = eval(&s, json!({ "jobRequest": { "metadata": { "user": "alice" } } }));
        assert!(out["resource"].is_null());
        assert_eq!(out["rationale"], "no match found");
    }

    #[test]
    fn no_fallback_means_null() {
        let s = compile(r#"{ "rules": [] }"#);
        assert!(eval(&s, json!({})).is_null());
    }

    #[test]
    fn rejects_invalid_documents() {
        let limits = ScriptLimits { max_operations: 0 };
        assert!(matches!(
            RulesEngine.compile("{ not json", limits),
            Err(CompileError::Syntax(_))
        ));
        assert!(matches!(
            RulesEngine.compile(r#"{ "rules": [], "extra": 1 }"#, limits),
            Err(CompileError::Syntax(_))
        ));
        assert!(matches!(
            RulesEngine.compile(
                r#"{ "rules": [ { "when": [ { "path": "user", "equals": 1 } ] } ] }"#,
                limits
            ),
            Err(CompileError::Invalid(_))
        ));
        assert!(matches!(
            RulesEngine.compile(
                r#"{ "rules": [ { "when": [ { "path": "/a", "equals": 1, "exists": true } ] } ] }"#,
                limits
            ),
            Err(CompileError::Invalid(_))
        ));
    }
}
