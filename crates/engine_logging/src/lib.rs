#![deny(missing_docs)]
//! Shared logging utilities for the workbench crates.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! job-scoped variants that prefix every line with the job id, and a minimal
//! test initializer for the global logger.

/// Formats the prefix used by the `engine_job_*` macros.
pub fn job_prefix(job_id: u64) -> String {
    format!("[job #{job_id}]")
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs an info-level message tagged with a job id.
#[macro_export]
macro_rules! engine_job_info {
    ($job_id:expr, $($arg:tt)*) => {{
        log::info!("{} {}", $crate::job_prefix($job_id), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with a job id.
#[macro_export]
macro_rules! engine_job_debug {
    ($job_id:expr, $($arg:tt)*) => {{
        log::debug!("{} {}", $crate::job_prefix($job_id), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with a job id.
#[macro_export]
macro_rules! engine_job_warn {
    ($job_id:expr, $($arg:tt)*) => {{
        log::warn!("{} {}", $crate::job_prefix($job_id), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with a job id.
#[macro_export]
macro_rules! engine_job_error {
    ($job_id:expr, $($arg:tt)*) => {{
        log::error!("{} {}", $crate::job_prefix($job_id), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::job_prefix;

    #[test]
    fn job_prefix_includes_id() {
        assert_eq!(job_prefix(7), "[job #7]");
    }
}
