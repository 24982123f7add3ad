use serde::{Deserialize, Serialize};

/// Configuration of one managed script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptProperties {
    /// Script location: path, `file://`, `bundled:` or `http(s)://` URI.
    pub source: Option<String>,
    pub enabled: bool,
    /// Load immediately when the refresh loop starts instead of waiting one interval.
    pub auto_load: bool,
    pub refresh_interval_ms: u64,
    /// Per-call evaluation timeout.
    pub timeout_ms: u64,
    /// Engine operation budget per evaluation; `0` disables the budget.
    pub max_operations: u64,
}

impl Default for ScriptProperties {
    fn default() -> Self {
        Self {
            source: None,
            enabled: false,
            auto_load: true,
            refresh_interval_ms: 300_000,
            timeout_ms: 5_000,
            max_operations: 10_000_000,
        }
    }
}

impl ScriptProperties {
    /// Enabled properties pointing at `source`, other fields default.
    pub fn enabled(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            enabled: true,
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_refresh_interval_ms(mut self, refresh_interval_ms: u64) -> Self {
        self.refresh_interval_ms = refresh_interval_ms;
        self
    }

    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    pub fn limits(&self) -> ScriptLimits {
        ScriptLimits {
            max_operations: self.max_operations,
        }
    }
}

/// Evaluation limits handed to engines at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptLimits {
    pub max_operations: u64,
}
