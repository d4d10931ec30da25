use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

/// One exported visual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

/// What a successful run hands back. The core never looks inside the files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultHandle {
    pub output_dir: PathBuf,
    pub artifacts: Vec<Artifact>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(ResultHandle),
    Failed { description: String },
    Cancelled,
}

/// A unit of information emitted by the runner during one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress {
        percent: Option<u8>,
        step: Option<String>,
    },
    Log {
        severity: Severity,
        text: String,
    },
    /// Terminal outcome. Always the last event of a job.
    Finished(Outcome),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Finished(_))
    }
}
