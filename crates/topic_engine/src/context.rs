use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::{EngineEvent, EventKind, JobArtifacts, JobFailure, JobId, LogLevel};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Per-job handle given to a backend. It numbers events, scopes them to one
/// job, and refuses to emit anything after the terminal event.
pub struct JobContext {
    job_id: JobId,
    output_dir: PathBuf,
    sink: Arc<dyn EventSink>,
    next_seq: Mutex<u64>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new(
        job_id: JobId,
        output_dir: PathBuf,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job_id,
            output_dir,
            sink,
            next_seq: Mutex::new(0),
            closed: AtomicBool::new(false),
            cancel,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Directory the job writes its artifacts into. Created before the backend runs.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Reports progress. Values above 100 are clamped.
    pub fn progress(&self, percent: u8, step: impl Into<String>) {
        self.emit(EventKind::Progress {
            percent: Some(percent.min(100)),
            step: Some(step.into()),
        });
    }

    /// Names the current step without changing the percentage.
    pub fn step(&self, label: impl Into<String>) {
        self.emit(EventKind::Progress {
            percent: None,
            step: Some(label.into()),
        });
    }

    pub fn log(&self, level: LogLevel, text: impl Into<String>) {
        self.emit(EventKind::Log {
            level,
            text: text.into(),
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.log(LogLevel::Info, text);
    }

    pub fn warn(&self, text: impl Into<String>) {
        self.log(LogLevel::Warn, text);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub(crate) fn complete(&self, result: Result<JobArtifacts, JobFailure>) {
        self.emit(EventKind::Completed(result));
    }

    fn emit(&self, kind: EventKind) {
        // Numbering and sending happen under one lock so channel order matches seq order.
        let mut next_seq = self.next_seq.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if kind.is_terminal() {
            self.closed.store(true, Ordering::Release);
        }
        let seq = *next_seq;
        *next_seq += 1;
        self.sink.emit(EngineEvent {
            job_id: self.job_id,
            seq,
            kind,
        });
    }
}
