use std::any::Any;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_job_debug, engine_job_info, engine_job_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::context::{ChannelEventSink, EventSink, JobContext};
use crate::manifest::write_manifest;
use crate::persist::ensure_output_dir;
use crate::{
    ComputeBackend, EngineError, EngineEvent, FailureKind, JobArtifacts, JobFailure, JobId,
    JobRequest,
};

enum EngineCommand {
    Start(JobRequest),
    Cancel(JobId),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub worker_threads: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { worker_threads: 2 }
    }
}

type CancelRegistry = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Command side of the background runner. Cheap to clone; the engine thread
/// stops once every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Event side of the background runner. Events of one job arrive in `seq` order.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn spawn(
        backend: Arc<dyn ComputeBackend>,
        settings: EngineSettings,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(settings.worker_threads.max(1))
            .thread_name("topic-engine-worker")
            .enable_all()
            .build()
            .map_err(EngineError::Runtime)?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("topic-engine".to_string())
            .spawn(move || command_loop(runtime, backend, cmd_rx, event_tx))
            .map_err(EngineError::Thread)?;

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    /// Queues a job. Returns immediately.
    pub fn start(&self, request: JobRequest) -> Result<(), EngineError> {
        self.cmd_tx
            .send(EngineCommand::Start(request))
            .map_err(|_| EngineError::Disconnected)
    }

    /// Requests cancellation of a running job. Unknown or finished jobs are ignored.
    pub fn cancel(&self, job_id: JobId) -> Result<(), EngineError> {
        self.cmd_tx
            .send(EngineCommand::Cancel(job_id))
            .map_err(|_| EngineError::Disconnected)
    }
}

impl EngineEvents {
    /// Blocks until the next event. `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn lock(registry: &CancelRegistry) -> MutexGuard<'_, HashMap<JobId, CancellationToken>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn command_loop(
    runtime: Runtime,
    backend: Arc<dyn ComputeBackend>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let registry: CancelRegistry = Arc::new(Mutex::new(HashMap::new()));
    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Start(request) => {
                let job_id = request.job_id;
                let token = CancellationToken::new();
                {
                    let mut tokens = lock(&registry);
                    if tokens.contains_key(&job_id) {
                        engine_job_warn!(job_id, "Start ignored: job is already running");
                        continue;
                    }
                    tokens.insert(job_id, token.clone());
                }
                let backend = backend.clone();
                let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx.clone()));
                let registry = registry.clone();
                runtime.spawn(async move {
                    run_job(backend, request, sink, token).await;
                    lock(&registry).remove(&job_id);
                });
            }
            EngineCommand::Cancel(job_id) => match lock(&registry).get(&job_id) {
                Some(token) => {
                    engine_job_info!(job_id, "Cancellation requested");
                    token.cancel();
                }
                None => engine_job_debug!(job_id, "Cancel ignored: job is not running"),
            },
        }
    }
    engine_debug!("Engine command channel closed; shutting down runtime");
}

async fn run_job(
    backend: Arc<dyn ComputeBackend>,
    request: JobRequest,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
) {
    let job_id = request.job_id;
    let task = request.task.clone();
    let output_dir = request.output_dir();
    let ctx = Arc::new(JobContext::new(
        job_id,
        output_dir.clone(),
        sink,
        token.clone(),
    ));
    engine_job_info!(job_id, "Starting {} task in {}", task, output_dir.display());

    let result = match ensure_output_dir(&output_dir) {
        Ok(()) => {
            let task_ctx = ctx.clone();
            // A nested task turns a backend panic into a JoinError instead of
            // tearing down the runner.
            let handle = tokio::spawn(async move { backend.run(&request, &task_ctx).await });
            match handle.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => Err(JobFailure::new(
                    FailureKind::Panicked,
                    panic_message(err.into_panic()),
                )),
                Err(_) => Err(JobFailure::cancelled()),
            }
        }
        Err(err) => Err(JobFailure::new(FailureKind::Io, err.to_string())),
    };

    let result = if token.is_cancelled() {
        Err(JobFailure::cancelled())
    } else {
        result.and_then(|artifacts| finish_artifacts(job_id, &task, artifacts))
    };

    match &result {
        Ok(artifacts) => engine_job_info!(
            job_id,
            "Finished with {} artifact(s)",
            artifacts.artifacts.len()
        ),
        Err(failure) if failure.kind == FailureKind::Cancelled => {
            engine_job_info!(job_id, "Cancelled")
        }
        Err(failure) => engine_job_warn!(job_id, "Failed: {}", failure),
    }
    ctx.complete(result);
}

fn finish_artifacts(
    job_id: JobId,
    task: &str,
    artifacts: JobArtifacts,
) -> Result<JobArtifacts, JobFailure> {
    if artifacts.artifacts.is_empty() {
        return Ok(artifacts);
    }
    let path = write_manifest(job_id, task, &artifacts).map_err(|err| {
        JobFailure::new(FailureKind::Io, format!("failed to write manifest: {err}"))
    })?;
    engine_job_debug!(job_id, "Wrote {}", path.display());
    Ok(artifacts)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("backend panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("backend panicked: {message}")
    } else {
        "backend panicked".to_string()
    }
}
