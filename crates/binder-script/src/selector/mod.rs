//! Script-backed selectors for the three selection use cases.
//!
//! Each selector builds the argument map, evaluates its [`ManagedScript`] and validates
//! the result against the offered set. Accepted script results:
//! - `()` / `null` → no preference;
//! - a string → id (or launcher name) of an offered resource;
//! - an offered resource object, matched by its `id` / `name` field;
//! - a map `{ resource, rationale }` where `resource` is null, a string, or an offered
//!   resource object.
//!
//! Anything else, or a reference outside the offered set, is a selection error.
mod cluster;
pub use cluster::ClusterScriptSelector;

mod command;
pub use command::CommandScriptSelector;

mod launcher;
pub use launcher::LauncherScriptSelector;

use binder_core::selector::SelectionError;
use binder_model::{JobId, JobRequest};
use serde::Serialize;
use serde_json::Value;

use crate::{ScriptArguments, ScriptError};

/// Parsed script decision: an optional resource key plus optional rationale.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Decision {
    pub key: Option<String>,
    pub rationale: Option<String>,
}

impl Decision {
    /// Interpret a script result. `key_field` is the identifying field of resource objects.
    pub(crate) fn parse(selector: &str, key_field: &str, output: Value) -> Result<Self, SelectionError> {
        let invalid = |reason: String| SelectionError::InvalidResult {
            selector: selector.to_string(),
            reason,
        };
        let key_of = |v: &Value| -> Result<Option<String>, SelectionError> {
            match v {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(s.clone())),
                Value::Object(m) => match m.get(key_field) {
                    Some(Value::String(s)) => Ok(Some(s.clone())),
                    _ => Err(invalid(format!("resource object has no string '{key_field}'"))),
                },
                other => Err(invalid(format!("unexpected resource value {other}"))),
            }
        };

        match output {
            Value::Null => Ok(Decision {
                key: None,
                rationale: None,
            }),
            Value::String(s) => Ok(Decision {
                key: Some(s),
                rationale: None,
            }),
            Value::Object(map) if !map.contains_key("resource") && !map.contains_key("rationale") => {
                Ok(Decision {
                    key: key_of(&Value::Object(map))?,
                    rationale: None,
                })
            }
            Value::Object(map) => {
                let key = match map.get("resource") {
                    Some(v) => key_of(v)?,
                    None => None,
                };
                let rationale = match map.get("rationale") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => return Err(invalid(format!("rationale must be a string, got {other}"))),
                };
                Ok(Decision { key, rationale })
            }
            other => Err(invalid(format!("unexpected result {other}"))),
        }
    }
}

/// Arguments common to every use case.
pub(crate) fn base_arguments(
    selector: &str,
    job_id: &JobId,
    request: &JobRequest,
    api_job: bool,
) -> Result<ScriptArguments, SelectionError> {
    let mut args = ScriptArguments::new();
    args.insert("jobId".into(), Value::String(job_id.to_string()));
    args.insert("jobRequest".into(), to_argument(selector, request)?);
    args.insert("apiJob".into(), Value::Bool(api_job));
    Ok(args)
}

pub(crate) fn to_argument<T: Serialize>(selector: &str, value: &T) -> Result<Value, SelectionError> {
    serde_json::to_value(value).map_err(|e| SelectionError::Execution {
        selector: selector.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn selection_error(selector: &str, error: ScriptError) -> SelectionError {
    match error {
        ScriptError::NotConfigured(_) => SelectionError::NotConfigured(selector.to_string()),
        other => SelectionError::Execution {
            selector: selector.to_string(),
            source: Box::new(other),
        },
    }
}
