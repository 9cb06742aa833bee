//! Domain log facade.
//!
//! The domain and application layers log through [`dispatch`] so they never
//! depend on a concrete subscriber. The composition root installs a real
//! logger (tracing-backed) once at startup via [`set_logger`]; until then
//! log calls are dropped.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::ports::{LogLevel, LoggerPort};

static LOGGER: OnceLock<Arc<dyn LoggerPort>> = OnceLock::new();

/// Install the process-wide logger. The first call wins; later calls are
/// ignored (returns `false`).
pub fn set_logger(logger: Arc<dyn LoggerPort>) -> bool {
    LOGGER.set(logger).is_ok()
}

/// Dispatch a log record to the installed logger, if any.
pub fn dispatch(level: LogLevel, context: &str, message: &str, detail: Option<&dyn Display>) {
    if let Some(logger) = LOGGER.get() {
        logger.log(level, context, message, detail);
    }
}
