//! Structured logging with tracing.
//!
//! Installs the subscriber once per process and bridges the domain log
//! facade onto it, so every layer logs through `omr_domain::{info,...}!`
//! without a direct tracing dependency.

use std::fmt::Display;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use omr_domain::error::{Error, Result};
use omr_domain::ports::{LogLevel, LoggerPort};

use crate::config::LoggingConfig;

/// [`LoggerPort`] forwarding to the tracing subscriber.
pub struct TracingLogger;

impl LoggerPort for TracingLogger {
    fn log(&self, level: LogLevel, context: &str, message: &str, detail: Option<&dyn Display>) {
        let detail = detail.map(|d| d.to_string());
        let detail = detail.as_deref().unwrap_or("");
        match level {
            LogLevel::Trace => tracing::trace!(context, detail, "{message}"),
            LogLevel::Debug => tracing::debug!(context, detail, "{message}"),
            LogLevel::Info => tracing::info!(context, detail, "{message}"),
            LogLevel::Warn => tracing::warn!(context, detail, "{message}"),
            LogLevel::Error => tracing::error!(context, detail, "{message}"),
        }
    }
}

/// Initialize the subscriber and install the domain-facade bridge.
///
/// `RUST_LOG` wins over the configured level when set. Calling twice is an
/// error (the subscriber refuses reinstallation).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::config(format!("bad log filter '{}': {e}", config.level)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::config(format!("could not install subscriber: {e}")))?;

    omr_domain::infra::logging::set_logger(Arc::new(TracingLogger));
    Ok(())
}
