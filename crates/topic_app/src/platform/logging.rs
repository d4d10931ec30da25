//! Logging setup for the workbench binary.
//!
//! File output goes to `logs/topic_workbench_<timestamp>.log` under the
//! current working directory, so each session keeps its own log.

use std::fs::{self, File};
use std::path::PathBuf;

use chrono::Local;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_DIR: &str = "logs";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// A timestamped file under `./logs`.
    File,
    /// Standard error, interleaved with console output.
    Terminal,
    Both,
}

/// Installs the global logger. Falls back to the terminal when the log file
/// cannot be created.
pub fn initialize(destination: LogDestination, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(level, config.clone()) {
            loggers.push(file_logger);
        }
    }
    if destination != LogDestination::File || loggers.is_empty() {
        loggers.push(TermLogger::new(
            level,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("topic_")
        .build()
}

fn log_path() -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(LOG_DIR).join(format!("topic_workbench_{stamp}.log"))
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let path = log_path();
    let created = fs::create_dir_all(LOG_DIR).and_then(|_| File::create(&path));
    match created {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file {}: {}", path.display(), err);
            None
        }
    }
}
