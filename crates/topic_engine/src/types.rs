use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Maps a level name written by a worker. Unknown names read as info.
    pub fn from_worker(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" | "critical" | "fatal" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// One event emitted by the runner. `seq` increases by one per event within a job.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub job_id: JobId,
    pub seq: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Progress {
        percent: Option<u8>,
        step: Option<String>,
    },
    Log {
        level: LogLevel,
        text: String,
    },
    Completed(Result<JobArtifacts, JobFailure>),
}

impl EventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Completed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobArtifacts {
    pub output_dir: PathBuf,
    pub artifacts: Vec<ArtifactFile>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "cancelled by user")
    }

    pub fn computation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Computation, message)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    Computation,
    Panicked,
    Spawn,
    Protocol,
    ExitStatus(Option<i32>),
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Computation => write!(f, "computation failed"),
            FailureKind::Panicked => write!(f, "backend panicked"),
            FailureKind::Spawn => write!(f, "worker could not be started"),
            FailureKind::Protocol => write!(f, "worker protocol error"),
            FailureKind::ExitStatus(Some(code)) => write!(f, "worker exited with status {code}"),
            FailureKind::ExitStatus(None) => write!(f, "worker terminated by signal"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Work order handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub job_id: JobId,
    /// Task name understood by the worker, e.g. `modeling`.
    pub task: String,
    pub payload: serde_json::Value,
    /// Extra environment for external workers.
    pub env: BTreeMap<String, String>,
    /// Parent of the per-job output directory.
    pub output_root: PathBuf,
}

impl JobRequest {
    pub fn new(
        job_id: JobId,
        task: impl Into<String>,
        payload: serde_json::Value,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id,
            task: task.into(),
            payload,
            env: BTreeMap::new(),
            output_root: output_root.into(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// `<output_root>/job-<id>`.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(format!("job-{:04}", self.job_id))
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build engine runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to spawn engine thread: {0}")]
    Thread(#[source] io::Error),
    #[error("engine has shut down")]
    Disconnected,
}
