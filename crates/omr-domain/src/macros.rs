//! Log facade macros.
//!
//! Call shape follows `tracing`'s level macros — `info!("producer",
//! "Job submitted")` with an optional `Display`able third argument — but
//! the record goes through [`crate::infra::logging::dispatch`], so
//! domain and application code never link a subscriber directly.

/// Shared expansion behind the level macros. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $ctx:expr, $msg:expr) => {
        $crate::infra::logging::dispatch(
            $crate::ports::LogLevel::$level,
            $ctx,
            $msg,
            Option::<&dyn ::std::fmt::Display>::None,
        )
    };
    ($level:ident, $ctx:expr, $msg:expr, $detail:expr) => {{
        let detail: &dyn ::std::fmt::Display = $detail;
        $crate::infra::logging::dispatch($crate::ports::LogLevel::$level, $ctx, $msg, Some(detail))
    }};
}

/// Logs at trace level via the domain log facade.
#[macro_export]
macro_rules! trace {
    ($($record:tt)+) => { $crate::__log!(Trace, $($record)+) };
}

/// Logs at debug level via the domain log facade.
#[macro_export]
macro_rules! debug {
    ($($record:tt)+) => { $crate::__log!(Debug, $($record)+) };
}

/// Logs at info level via the domain log facade.
#[macro_export]
macro_rules! info {
    ($($record:tt)+) => { $crate::__log!(Info, $($record)+) };
}

/// Logs at warn level via the domain log facade.
#[macro_export]
macro_rules! warn {
    ($($record:tt)+) => { $crate::__log!(Warn, $($record)+) };
}

/// Logs at error level via the domain log facade.
#[macro_export]
macro_rules! error {
    ($($record:tt)+) => { $crate::__log!(Error, $($record)+) };
}
