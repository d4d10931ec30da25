mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use topic_core::Slot;

use platform::logging::LogDestination;
use platform::{AppOptions, BackendChoice, RunJob};

/// Topic workbench: configure, run and inspect topic-modeling jobs.
#[derive(Parser)]
#[command(name = "topic-workbench", version, about)]
struct Cli {
    /// Settings file (RON). Created on the first accepted change.
    #[arg(long, global = true, default_value = "topic_settings.ron")]
    settings: PathBuf,

    /// Run jobs with the built-in simulated backend instead of the worker.
    #[arg(long, global = true)]
    simulate: bool,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, default_value_t = LogTarget::File)]
    log: LogTarget,

    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console (default)
    Interactive,

    /// Run a single job without the console and exit with its outcome
    Run {
        /// Job slot: preprocess, modeling or visualization
        #[arg(long)]
        slot: Slot,

        /// Input document file (.csv, .xlsx, .xls, .txt)
        #[arg(long)]
        input: PathBuf,

        /// Form field assignment, e.g. --set text_column=content
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    platform::logging::initialize(cli.log.into(), cli.verbose);

    let options = AppOptions {
        settings_path: cli.settings,
        backend: if cli.simulate {
            BackendChoice::Simulated
        } else {
            BackendChoice::Worker
        },
    };

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => {
            platform::run_app(options)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            slot,
            input,
            fields,
        } => platform::run_once(
            options,
            RunJob {
                slot,
                input,
                fields,
            },
        ),
    }
}
