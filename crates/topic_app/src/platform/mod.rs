mod app;
mod console;
mod effects;
pub mod logging;
mod persistence;
mod ui;

use std::path::PathBuf;

use topic_core::Slot;

pub use app::{run_app, run_once};

/// Which compute backend the engine runs jobs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    /// The external worker program from the settings.
    Worker,
    Simulated,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub settings_path: PathBuf,
    pub backend: BackendChoice,
}

/// One headless job from the command line.
#[derive(Debug, Clone)]
pub struct RunJob {
    pub slot: Slot,
    pub input: PathBuf,
    /// `field=value` assignments applied to the form before submitting.
    pub fields: Vec<String>,
}
