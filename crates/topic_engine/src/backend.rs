use crate::{JobArtifacts, JobContext, JobFailure, JobRequest};

/// Performs the computation for one job.
///
/// Implementations report progress and logs through `ctx` and return the
/// terminal result. The runner emits the terminal event itself, so a backend
/// cannot finish a job twice. Cancellation is advisory: long-running work
/// should check `ctx.is_cancelled()` or race against `ctx.cancelled()`.
#[async_trait::async_trait]
pub trait ComputeBackend: Send + Sync {
    async fn run(&self, request: &JobRequest, ctx: &JobContext)
        -> Result<JobArtifacts, JobFailure>;
}
