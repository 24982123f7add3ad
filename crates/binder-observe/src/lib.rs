//! Logging setup for binder services.
//!
//! Library crates only emit `tracing` events; binaries call [`init_logger`] once at startup.
mod config;
mod error;
mod format;
mod install;
mod level;
mod timestamp;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use format::LoggerFormat;
pub use level::LoggerLevel;
pub use timestamp::{LoggerTimeZone, init_local_offset};

/// Installs the global tracing subscriber described by `cfg`.
///
/// For [`LoggerTimeZone::Local`] call [`init_local_offset`] in `main()` before the tokio
/// runtime starts; offset detection is unreliable once other threads exist.
///
/// # Examples
/// ```rust
/// use binder_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("logger");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
